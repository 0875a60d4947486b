//! Enclosing branch targets
//!
//! The stack mirrors the labeled blocks and loops around the node being
//! synthesized, innermost last.

use ruido_ir::{Expr, ExprKind, Name, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Block of the given type; a branch to it leaves the block
    Block(ValueType),
    /// A branch to a loop restarts it and never carries a value
    Loop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub label: Name,
    pub kind: ScopeKind,
}

impl Scope {
    pub fn block(label: Name, ty: ValueType) -> Self {
        Self { label, kind: ScopeKind::Block(ty) }
    }

    pub fn looping(label: Name) -> Self {
        Self { label, kind: ScopeKind::Loop }
    }

    /// The scope a labeled block or loop opens, if any
    pub fn of(expr: &Expr) -> Option<Self> {
        match &expr.kind {
            ExprKind::Block { name: Some(name), .. } => Some(Self::block(name.clone(), expr.ty)),
            ExprKind::Loop { name: Some(name), .. } => Some(Self::looping(name.clone())),
            _ => None,
        }
    }

    /// Type a branch to this scope must carry, `None` for valueless branches
    pub fn carried(&self) -> Option<ValueType> {
        match self.kind {
            ScopeKind::Block(ty) if ty.is_concrete() => Some(ty),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn exit(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    /// Targets a branch carrying `value` may take, innermost first
    ///
    /// `Some(t)` matches blocks of type `t`; `None` matches loops and
    /// blocks of type `none`.
    pub fn eligible_targets(&self, value: Option<ValueType>) -> Vec<&Scope> {
        self.scopes
            .iter()
            .rev()
            .filter(|scope| match (scope.kind, value) {
                (ScopeKind::Loop, None) => true,
                (ScopeKind::Loop, Some(_)) => false,
                (ScopeKind::Block(ty), None) => ty == ValueType::None,
                (ScopeKind::Block(ty), Some(value)) => ty == value && value.is_concrete(),
            })
            .collect()
    }

    /// Every scope an unconditional branch may take, innermost first
    pub fn all_targets(&self) -> Vec<&Scope> {
        self.scopes
            .iter()
            .rev()
            .filter(|scope| scope.kind != ScopeKind::Block(ValueType::Unreachable))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> ScopeStack {
        let mut stack = ScopeStack::new();
        stack.enter(Scope::block(Name::from("outer"), ValueType::None));
        stack.enter(Scope::looping(Name::from("spin")));
        stack.enter(Scope::block(Name::from("value"), ValueType::I64));
        stack.enter(Scope::block(Name::from("dead"), ValueType::Unreachable));
        stack
    }

    fn labels(scopes: Vec<&Scope>) -> Vec<&str> {
        scopes.into_iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_valueless_targets() {
        let stack = stack();
        assert_eq!(labels(stack.eligible_targets(None)), vec!["spin", "outer"]);
    }

    #[test]
    fn test_value_targets() {
        let stack = stack();
        assert_eq!(labels(stack.eligible_targets(Some(ValueType::I64))), vec!["value"]);
        assert!(stack.eligible_targets(Some(ValueType::F32)).is_empty());
    }

    #[test]
    fn test_all_targets_skip_unreachable_blocks() {
        let stack = stack();
        assert_eq!(labels(stack.all_targets()), vec!["value", "spin", "outer"]);
    }

    #[test]
    fn test_enter_exit_balance() {
        let mut stack = stack();
        assert_eq!(stack.len(), 4);
        while stack.exit().is_some() {}
        assert!(stack.is_empty());
        assert!(stack.all_targets().is_empty());
    }
}
