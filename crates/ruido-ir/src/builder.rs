//! Node construction
//!
//! `Builder` allocates expression nodes from already-built children and
//! computes each node's static type from them. Callers that need a
//! specific declared type (for example a block whose label is a branch
//! target of that type) use the `*_typed` variants.

use crate::expr::{Expr, ExprKind};
use crate::types::{BinaryOp, Literal, Name, ValueType};

/// Stateless constructor for expression nodes
pub struct Builder;

impl Builder {
    /// Block whose type is given explicitly
    pub fn block_typed(name: Option<Name>, list: Vec<Expr>, ty: ValueType) -> Expr {
        Expr::new(ExprKind::Block { name, list }, ty)
    }

    /// Block whose type is taken from its last child
    pub fn block(name: Option<Name>, list: Vec<Expr>) -> Expr {
        let ty = list.last().map_or(ValueType::None, |last| last.ty);
        Self::block_typed(name, list, ty)
    }

    /// Conditional whose type is given explicitly
    pub fn if_typed(condition: Expr, if_true: Expr, if_false: Option<Expr>, ty: ValueType) -> Expr {
        Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                if_true: Box::new(if_true),
                if_false: if_false.map(Box::new),
            },
            ty,
        )
    }

    /// Conditional whose type is joined from its arms
    pub fn make_if(condition: Expr, if_true: Expr, if_false: Option<Expr>) -> Expr {
        let ty = match &if_false {
            None => ValueType::None,
            Some(if_false) => Self::join(if_true.ty, if_false.ty),
        };
        Self::if_typed(condition, if_true, if_false, ty)
    }

    /// Loop; its type is its body's type
    pub fn make_loop(name: Option<Name>, body: Expr) -> Expr {
        let ty = body.ty;
        Expr::new(ExprKind::Loop { name, body: Box::new(body) }, ty)
    }

    /// Loop whose type is given explicitly
    pub fn loop_typed(name: Option<Name>, body: Expr, ty: ValueType) -> Expr {
        Expr::new(ExprKind::Loop { name, body: Box::new(body) }, ty)
    }

    /// Unconditional branch; never falls through
    pub fn br(name: Name, value: Option<Expr>) -> Expr {
        Expr::new(
            ExprKind::Break {
                name,
                value: value.map(Box::new),
                condition: None,
            },
            ValueType::Unreachable,
        )
    }

    /// Conditional branch; falls through with its value when not taken
    pub fn br_if(name: Name, value: Option<Expr>, condition: Expr) -> Expr {
        let ty = value.as_ref().map_or(ValueType::None, |v| v.ty);
        Expr::new(
            ExprKind::Break {
                name,
                value: value.map(Box::new),
                condition: Some(Box::new(condition)),
            },
            ty,
        )
    }

    pub fn call(target: Name, operands: Vec<Expr>, result: ValueType) -> Expr {
        Expr::new(ExprKind::Call { target, operands }, result)
    }

    pub fn call_import(target: Name, operands: Vec<Expr>, result: ValueType) -> Expr {
        Expr::new(ExprKind::CallImport { target, operands }, result)
    }

    pub fn call_indirect(params: Vec<ValueType>, result: ValueType, target: Expr, operands: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::CallIndirect {
                params,
                target: Box::new(target),
                operands,
            },
            result,
        )
    }

    pub fn constant(literal: Literal) -> Expr {
        Expr::new(ExprKind::Const(literal), literal.ty())
    }

    pub fn local_get(index: u32, ty: ValueType) -> Expr {
        Expr::new(ExprKind::LocalGet { index }, ty)
    }

    pub fn local_set(index: u32, value: Expr) -> Expr {
        Expr::new(ExprKind::LocalSet { index, value: Box::new(value) }, ValueType::None)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let ty = Self::join(left.ty, right.ty);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn select(if_true: Expr, if_false: Expr, condition: Expr) -> Expr {
        let ty = Self::join(if_true.ty, if_false.ty);
        Expr::new(
            ExprKind::Select {
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
                condition: Box::new(condition),
            },
            ty,
        )
    }

    pub fn drop(value: Expr) -> Expr {
        Expr::new(ExprKind::Drop { value: Box::new(value) }, ValueType::None)
    }

    pub fn ret(value: Option<Expr>) -> Expr {
        Expr::new(ExprKind::Return { value: value.map(Box::new) }, ValueType::Unreachable)
    }

    pub fn nop() -> Expr {
        Expr::new(ExprKind::Nop, ValueType::None)
    }

    /// The divergent terminal node
    pub fn unreachable() -> Expr {
        Expr::new(ExprKind::Unreachable, ValueType::Unreachable)
    }

    /// Least type both sides fit into; `none` when they disagree
    fn join(a: ValueType, b: ValueType) -> ValueType {
        match (a, b) {
            _ if a == b => a,
            (ValueType::Unreachable, other) | (other, ValueType::Unreachable) => other,
            _ => ValueType::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i32_const(v: i32) -> Expr {
        Builder::constant(Literal::I32(v))
    }

    #[test]
    fn test_block_type_from_last_child() {
        let block = Builder::block(Some(Name::from("b")), vec![Builder::nop(), i32_const(1)]);
        assert_eq!(block.ty, ValueType::I32);

        let empty = Builder::block(None, vec![]);
        assert_eq!(empty.ty, ValueType::None);
    }

    #[test]
    fn test_if_joins_arms() {
        let both = Builder::make_if(i32_const(1), i32_const(2), Some(Builder::unreachable()));
        assert_eq!(both.ty, ValueType::I32);

        let one_armed = Builder::make_if(i32_const(1), Builder::nop(), None);
        assert_eq!(one_armed.ty, ValueType::None);
    }

    #[test]
    fn test_branch_types() {
        let br = Builder::br(Name::from("out"), Some(i32_const(3)));
        assert_eq!(br.ty, ValueType::Unreachable);

        let br_if = Builder::br_if(Name::from("out"), Some(i32_const(3)), i32_const(0));
        assert_eq!(br_if.ty, ValueType::I32);

        let bare = Builder::br_if(Name::from("top"), None, i32_const(0));
        assert_eq!(bare.ty, ValueType::None);
    }

    #[test]
    fn test_loop_takes_body_type() {
        let lp = Builder::make_loop(Some(Name::from("l")), i32_const(9));
        assert_eq!(lp.ty, ValueType::I32);
        assert_eq!(lp.label(), Some(&Name::from("l")));
    }
}
