//! Text printer
//!
//! Renders modules in the s-expression format read by `ruido-parser`.
//! Leaves are printed on one line; every other node opens a line, prints
//! its children one level deeper and closes on a line of its own.

use std::fmt::{self, Write};

use crate::expr::{Expr, ExprKind};
use crate::module::{Function, Import, Module, Table};
use crate::types::ValueType;

const INDENT: &str = "  ";

fn write_types(f: &mut impl Write, keyword: &str, types: &[ValueType]) -> fmt::Result {
    if types.is_empty() {
        return Ok(());
    }
    write!(f, " ({}", keyword)?;
    for ty in types {
        write!(f, " {}", ty)?;
    }
    write!(f, ")")
}

fn write_result(f: &mut impl Write, ty: ValueType) -> fmt::Result {
    if ty == ValueType::None {
        Ok(())
    } else {
        write!(f, " (result {})", ty)
    }
}

/// Writes the opening of a node, without its children
fn write_head(f: &mut impl Write, expr: &Expr) -> fmt::Result {
    match &expr.kind {
        ExprKind::Block { name, .. } | ExprKind::Loop { name, .. } => {
            write!(f, "{}", expr.mnemonic())?;
            if let Some(name) = name {
                write!(f, " {}", name)?;
            }
            write_result(f, expr.ty)
        }
        ExprKind::If { .. } | ExprKind::Select { .. } => {
            write!(f, "{}", expr.mnemonic())?;
            write_result(f, expr.ty)
        }
        ExprKind::Break { name, .. } => write!(f, "{} {}", expr.mnemonic(), name),
        ExprKind::Call { target, .. } | ExprKind::CallImport { target, .. } => {
            write!(f, "{} {}", expr.mnemonic(), target)
        }
        ExprKind::CallIndirect { params, .. } => {
            write!(f, "{}", expr.mnemonic())?;
            write_types(f, "param", params)?;
            write_result(f, expr.ty)
        }
        ExprKind::Const(literal) => write!(f, "{}", literal),
        ExprKind::LocalGet { index } | ExprKind::LocalSet { index, .. } => {
            write!(f, "{} {}", expr.mnemonic(), index)
        }
        ExprKind::Binary { op, .. } => write!(f, "{}.{}", expr.ty, op),
        ExprKind::Drop { .. } | ExprKind::Return { .. } | ExprKind::Nop | ExprKind::Unreachable => {
            write!(f, "{}", expr.mnemonic())
        }
    }
}

/// Writes `expr` at the given indentation level
pub fn write_expr(f: &mut impl Write, expr: &Expr, level: usize) -> fmt::Result {
    let pad = INDENT.repeat(level);
    let children = expr.children();
    write!(f, "{}(", pad)?;
    write_head(f, expr)?;
    if children.is_empty() {
        return write!(f, ")");
    }
    for child in children {
        writeln!(f)?;
        write_expr(f, child, level + 1)?;
    }
    write!(f, "\n{})", pad)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, 0)
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(import {} {:?} {:?}", self.name, self.module, self.base)?;
        write_types(f, "param", &self.params)?;
        write_result(f, self.result)?;
        write!(f, ")")
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(table")?;
        for name in &self.names {
            write!(f, " {}", name)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(func {}", self.name)?;
        write_types(f, "param", &self.params)?;
        write_types(f, "local", &self.vars)?;
        write_result(f, self.result)?;
        writeln!(f)?;
        write_expr(f, &self.body, 1)?;
        write!(f, ")")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(module")?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        for import in &self.imports {
            write!(f, "\n{}{}", INDENT, import)?;
        }
        if let Some(table) = &self.table {
            write!(f, "\n{}{}", INDENT, table)?;
        }
        for func in &self.functions {
            let text = func.to_string();
            for line in text.lines() {
                write!(f, "\n{}{}", INDENT, line)?;
            }
        }
        writeln!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::types::{Literal, Name};

    #[test]
    fn test_leaf_on_one_line() {
        assert_eq!(Builder::nop().to_string(), "(nop)");
        assert_eq!(Builder::constant(Literal::I64(-7)).to_string(), "(i64.const -7)");
        assert_eq!(Builder::br(Name::from("out"), None).to_string(), "(br $out)");
    }

    #[test]
    fn test_nested_block_layout() {
        let block = Builder::block_typed(
            Some(Name::from("b")),
            vec![Builder::nop(), Builder::constant(Literal::I32(1))],
            ValueType::I32,
        );
        assert_eq!(block.to_string(), "(block $b (result i32)\n  (nop)\n  (i32.const 1)\n)");
    }

    #[test]
    fn test_module_layout() {
        let mut module = Module::named("m");
        module.add_import(Import::new("log", "env", "log", vec![ValueType::I32], ValueType::None));
        module.set_table(Table::new(vec![Name::from("main")]));
        module.add_function(Function::new("main", vec![], ValueType::None, Builder::nop()));

        let text = module.to_string();
        assert_eq!(
            text,
            "(module $m\n  (import $log \"env\" \"log\" (param i32))\n  (table $main)\n  (func $main\n    (nop)))\n"
        );
    }
}
