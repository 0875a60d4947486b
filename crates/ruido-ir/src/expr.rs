//! IR Expressions
//!
//! Function bodies are trees of typed expressions. Every node carries the
//! static type of the value it produces; `Unreachable` marks a node that
//! never falls through.

use crate::types::{BinaryOp, Literal, Name, ValueType};

/// A typed expression node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: ValueType,
}

/// The closed set of node kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// Sequence; the last child produces the block's value
    Block {
        name: Option<Name>,
        list: Vec<Expr>,
    },

    /// Two-armed conditional on an i32 condition
    If {
        condition: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Option<Box<Expr>>,
    },

    /// Runs its body once; a branch to the label restarts it
    Loop {
        name: Option<Name>,
        body: Box<Expr>,
    },

    /// `br` / `br_if` to an enclosing block or loop
    Break {
        name: Name,
        value: Option<Box<Expr>>,
        condition: Option<Box<Expr>>,
    },

    /// Direct call to a function of the module
    Call {
        target: Name,
        operands: Vec<Expr>,
    },

    /// Call to an imported function
    CallImport {
        target: Name,
        operands: Vec<Expr>,
    },

    /// Call through the table; the signature is `params -> ty`
    CallIndirect {
        params: Vec<ValueType>,
        target: Box<Expr>,
        operands: Vec<Expr>,
    },

    Const(Literal),

    LocalGet {
        index: u32,
    },

    LocalSet {
        index: u32,
        value: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Select {
        if_true: Box<Expr>,
        if_false: Box<Expr>,
        condition: Box<Expr>,
    },

    Drop {
        value: Box<Expr>,
    },

    Return {
        value: Option<Box<Expr>>,
    },

    Nop,

    Unreachable,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: ValueType) -> Self {
        Self { kind, ty }
    }

    /// Label declared by this node, if it is a labeled block or loop
    pub fn label(&self) -> Option<&Name> {
        match &self.kind {
            ExprKind::Block { name, .. } | ExprKind::Loop { name, .. } => name.as_ref(),
            _ => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self.kind, ExprKind::Unreachable)
    }

    /// Children in evaluation order
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Block { list, .. } => list.iter().collect(),
            ExprKind::If { condition, if_true, if_false } => {
                let mut out = vec![condition.as_ref(), if_true.as_ref()];
                out.extend(if_false.as_deref());
                out
            }
            ExprKind::Loop { body, .. } => vec![body.as_ref()],
            ExprKind::Break { value, condition, .. } => {
                value.as_deref().into_iter().chain(condition.as_deref()).collect()
            }
            ExprKind::Call { operands, .. } | ExprKind::CallImport { operands, .. } => {
                operands.iter().collect()
            }
            ExprKind::CallIndirect { target, operands, .. } => {
                let mut out: Vec<&Expr> = operands.iter().collect();
                out.push(target.as_ref());
                out
            }
            ExprKind::LocalSet { value, .. } | ExprKind::Drop { value } => vec![value.as_ref()],
            ExprKind::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            ExprKind::Select { if_true, if_false, condition } => {
                vec![if_true.as_ref(), if_false.as_ref(), condition.as_ref()]
            }
            ExprKind::Return { value } => value.as_deref().into_iter().collect(),
            ExprKind::Const(_) | ExprKind::LocalGet { .. } | ExprKind::Nop | ExprKind::Unreachable => {
                Vec::new()
            }
        }
    }

    /// Mutable children in evaluation order
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            ExprKind::Block { list, .. } => list.iter_mut().collect(),
            ExprKind::If { condition, if_true, if_false } => {
                let mut out = vec![condition.as_mut(), if_true.as_mut()];
                out.extend(if_false.as_deref_mut());
                out
            }
            ExprKind::Loop { body, .. } => vec![body.as_mut()],
            ExprKind::Break { value, condition, .. } => value
                .as_deref_mut()
                .into_iter()
                .chain(condition.as_deref_mut())
                .collect(),
            ExprKind::Call { operands, .. } | ExprKind::CallImport { operands, .. } => {
                operands.iter_mut().collect()
            }
            ExprKind::CallIndirect { target, operands, .. } => {
                let mut out: Vec<&mut Expr> = operands.iter_mut().collect();
                out.push(target.as_mut());
                out
            }
            ExprKind::LocalSet { value, .. } | ExprKind::Drop { value } => vec![value.as_mut()],
            ExprKind::Binary { left, right, .. } => vec![left.as_mut(), right.as_mut()],
            ExprKind::Select { if_true, if_false, condition } => {
                vec![if_true.as_mut(), if_false.as_mut(), condition.as_mut()]
            }
            ExprKind::Return { value } => value.as_deref_mut().into_iter().collect(),
            ExprKind::Const(_) | ExprKind::LocalGet { .. } | ExprKind::Nop | ExprKind::Unreachable => {
                Vec::new()
            }
        }
    }

    /// Number of nodes in the tree rooted here
    pub fn node_count(&self) -> usize {
        1 + self.children().into_iter().map(Expr::node_count).sum::<usize>()
    }

    /// Short mnemonic used in the text format
    pub fn mnemonic(&self) -> &'static str {
        match &self.kind {
            ExprKind::Block { .. } => "block",
            ExprKind::If { .. } => "if",
            ExprKind::Loop { .. } => "loop",
            ExprKind::Break { condition: None, .. } => "br",
            ExprKind::Break { condition: Some(_), .. } => "br_if",
            ExprKind::Call { .. } => "call",
            ExprKind::CallImport { .. } => "call_import",
            ExprKind::CallIndirect { .. } => "call_indirect",
            ExprKind::Const(_) => "const",
            ExprKind::LocalGet { .. } => "local.get",
            ExprKind::LocalSet { .. } => "local.set",
            ExprKind::Binary { .. } => "binary",
            ExprKind::Select { .. } => "select",
            ExprKind::Drop { .. } => "drop",
            ExprKind::Return { .. } => "return",
            ExprKind::Nop => "nop",
            ExprKind::Unreachable => "unreachable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop() -> Expr {
        Expr::new(ExprKind::Nop, ValueType::None)
    }

    #[test]
    fn test_children_follow_evaluation_order() {
        let cond = Expr::new(ExprKind::Const(Literal::I32(1)), ValueType::I32);
        let expr = Expr::new(
            ExprKind::If {
                condition: Box::new(cond.clone()),
                if_true: Box::new(nop()),
                if_false: Some(Box::new(Expr::new(ExprKind::Unreachable, ValueType::Unreachable))),
            },
            ValueType::None,
        );

        let kinds: Vec<_> = expr.children().iter().map(|c| c.mnemonic()).collect();
        assert_eq!(kinds, vec!["const", "nop", "unreachable"]);
        assert_eq!(expr.node_count(), 4);
    }

    #[test]
    fn test_label_only_on_scopes() {
        let block = Expr::new(
            ExprKind::Block { name: Some(Name::from("outer")), list: vec![nop()] },
            ValueType::None,
        );
        assert_eq!(block.label().map(Name::as_str), Some("outer"));
        assert_eq!(nop().label(), None);
    }

    #[test]
    fn test_children_mut_allows_replacement() {
        let mut block = Expr::new(ExprKind::Block { name: None, list: vec![nop(), nop()] }, ValueType::None);
        for child in block.children_mut() {
            *child = Expr::new(ExprKind::Unreachable, ValueType::Unreachable);
        }
        assert!(block.children().iter().all(|c| c.is_unreachable()));
    }
}
