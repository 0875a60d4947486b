//! IR Type System
//!
//! The closed set of static result types every expression carries,
//! plus names and constant literals.

use std::fmt;

/// Static result type of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    /// No value
    None,
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Divergent: control never falls through, fits any context
    Unreachable,
}

impl ValueType {
    /// The four value-carrying types
    pub const CONCRETE: [ValueType; 4] = [ValueType::I32, ValueType::I64, ValueType::F32, ValueType::F64];

    /// Every type, in declaration order
    pub const ALL: [ValueType; 6] = [
        ValueType::None,
        ValueType::I32,
        ValueType::I64,
        ValueType::F32,
        ValueType::F64,
        ValueType::Unreachable,
    ];

    /// Checks if the type carries a value
    pub fn is_concrete(self) -> bool {
        matches!(self, ValueType::I32 | ValueType::I64 | ValueType::F32 | ValueType::F64)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ValueType::I32 | ValueType::I64)
    }

    /// Checks if a node of this type may stand where `expected` is required
    pub fn fits(self, expected: ValueType) -> bool {
        self == expected || self == ValueType::Unreachable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::None => "none",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Unreachable => "unreachable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label or function identifier (written `$name` in text)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name(name.to_string())
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Name(name)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Constant value; floats are kept as bits so trees compare exactly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    I32(i32),
    I64(i64),
    F32(u32),
    F64(u64),
}

impl Literal {
    pub fn f32(v: f32) -> Self {
        Literal::F32(v.to_bits())
    }

    pub fn f64(v: f64) -> Self {
        Literal::F64(v.to_bits())
    }

    /// The zero of a concrete type
    pub fn zero(ty: ValueType) -> Option<Self> {
        match ty {
            ValueType::I32 => Some(Literal::I32(0)),
            ValueType::I64 => Some(Literal::I64(0)),
            ValueType::F32 => Some(Literal::f32(0.0)),
            ValueType::F64 => Some(Literal::f64(0.0)),
            ValueType::None | ValueType::Unreachable => None,
        }
    }

    pub fn ty(&self) -> ValueType {
        match self {
            Literal::I32(_) => ValueType::I32,
            Literal::I64(_) => ValueType::I64,
            Literal::F32(_) => ValueType::F32,
            Literal::F64(_) => ValueType::F64,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::I32(v) => write!(f, "i32.const {}", v),
            Literal::I64(v) => write!(f, "i64.const {}", v),
            Literal::F32(bits) => write!(f, "f32.const {:?}", f32::from_bits(*bits)),
            Literal::F64(bits) => write!(f, "f64.const {:?}", f64::from_bits(*bits)),
        }
    }
}

/// Binary arithmetic on operands of the result type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "add" => Some(BinaryOp::Add),
            "sub" => Some(BinaryOp::Sub),
            "mul" => Some(BinaryOp::Mul),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
