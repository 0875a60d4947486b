//! Tree traversal
//!
//! `walk_expr` visits every node of a tree exactly once, children before
//! parents, in evaluation order. Labeled blocks and loops are reported to
//! the visitor on entry (before their children) and on exit (after their
//! children, before the node's own visit), so a visitor can keep a stack
//! of enclosing branch targets. A visitor may overwrite the node it is
//! handed; the replacement is not walked again.

use crate::expr::Expr;

/// Per-node callback used by [`walk_expr`]
pub trait Visitor {
    /// Called before the children of a labeled block or loop
    fn enter_scope(&mut self, _scope: &Expr) {}

    /// Called after the children of a labeled block or loop
    fn exit_scope(&mut self, _scope: &Expr) {}

    /// Called once for every node, after its children
    fn visit_expr(&mut self, expr: &mut Expr);
}

/// Walks `expr` post-order, allowing in-place replacement
pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &mut Expr) {
    let scoped = expr.label().is_some();
    if scoped {
        visitor.enter_scope(expr);
    }
    for child in expr.children_mut() {
        walk_expr(visitor, child);
    }
    if scoped {
        visitor.exit_scope(expr);
    }
    visitor.visit_expr(expr);
}

/// Calls `f` on every node, parents before children
pub fn for_each_expr<F: FnMut(&Expr)>(expr: &Expr, f: &mut F) {
    f(expr);
    for child in expr.children() {
        for_each_expr(child, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::types::{Literal, Name, ValueType};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        depth: usize,
    }

    impl Visitor for Recorder {
        fn enter_scope(&mut self, scope: &Expr) {
            self.depth += 1;
            self.events.push(format!("enter {}", scope.label().map(Name::as_str).unwrap_or("?")));
        }

        fn exit_scope(&mut self, scope: &Expr) {
            self.depth -= 1;
            self.events.push(format!("exit {}", scope.label().map(Name::as_str).unwrap_or("?")));
        }

        fn visit_expr(&mut self, expr: &mut Expr) {
            self.events.push(expr.mnemonic().to_string());
        }
    }

    fn sample() -> Expr {
        Builder::block(
            Some(Name::from("outer")),
            vec![
                Builder::make_loop(Some(Name::from("inner")), Builder::nop()),
                Builder::block(None, vec![Builder::drop(Builder::constant(Literal::I32(1)))]),
            ],
        )
    }

    #[test]
    fn test_post_order_with_scopes() {
        let mut body = sample();
        let mut recorder = Recorder::default();
        walk_expr(&mut recorder, &mut body);

        assert_eq!(
            recorder.events,
            vec![
                "enter outer",
                "enter inner",
                "nop",
                "exit inner",
                "loop",
                "const",
                "drop",
                "block",
                "exit outer",
                "block",
            ]
        );
        assert_eq!(recorder.depth, 0);
    }

    struct ReplaceNops;

    impl Visitor for ReplaceNops {
        fn visit_expr(&mut self, expr: &mut Expr) {
            if expr.mnemonic() == "nop" {
                *expr = Builder::unreachable();
            }
        }
    }

    #[test]
    fn test_replacement_in_place() {
        let mut body = sample();
        walk_expr(&mut ReplaceNops, &mut body);

        let mut unreachable = 0;
        for_each_expr(&body, &mut |e| {
            if e.is_unreachable() {
                unreachable += 1;
            }
        });
        assert_eq!(unreachable, 1);
        assert_eq!(body.ty, ValueType::None);
    }
}
