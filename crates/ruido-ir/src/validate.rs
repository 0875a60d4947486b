//! Module validation
//!
//! Checks that every node's declared type matches what its position
//! requires, that branches target an enclosing construct of a compatible
//! type, that labels are unique per function and that calls agree with
//! their callee's signature.

use std::collections::HashSet;

use ruido_error::{Diagnostic, Diagnostics, ErrorCode};

use crate::expr::{Expr, ExprKind};
use crate::module::{Function, Module, Signature};
use crate::types::{Name, ValueType};

/// What an enclosing label accepts
#[derive(Debug, Clone, Copy)]
enum Target {
    Block(ValueType),
    Loop,
}

/// Validates every function of the module
pub fn validate_module(module: &Module) -> Diagnostics {
    let mut diags = Diagnostics::new();

    let mut seen = HashSet::new();
    for name in module.functions.iter().map(|f| &f.name).chain(module.imports.iter().map(|i| &i.name)) {
        if !seen.insert(name) {
            diags.push(
                Diagnostic::error(format!("`{}` is defined more than once", name))
                    .with_code(ErrorCode::DUPLICATE_DEFINITION),
            );
        }
    }

    if let Some(table) = &module.table {
        for (ordinal, name) in table.names.iter().enumerate() {
            if module.get_function(name).is_none() {
                diags.push(
                    Diagnostic::error(format!("table entry {} names unknown function `{}`", ordinal, name))
                        .with_code(ErrorCode::UNKNOWN_FUNCTION),
                );
            }
        }
    }

    for func in &module.functions {
        diags.extend(validate_function(module, func));
    }
    diags
}

/// Validates one function body against its signature
pub fn validate_function(module: &Module, func: &Function) -> Diagnostics {
    let mut validator = Validator {
        module,
        func,
        targets: Vec::new(),
        labels: HashSet::new(),
        diags: Diagnostics::new(),
    };
    validator.check(&func.body, func.result);
    debug_assert!(validator.targets.is_empty());
    validator.diags
}

struct Validator<'m> {
    module: &'m Module,
    func: &'m Function,
    /// Enclosing labels, innermost last
    targets: Vec<(&'m Name, Target)>,
    labels: HashSet<&'m Name>,
    diags: Diagnostics,
}

impl<'m> Validator<'m> {
    fn error(&mut self, code: ErrorCode, message: String) {
        self.diags.push(
            Diagnostic::error(message)
                .with_code(code)
                .with_note(format!("in function `{}`", self.func.name)),
        );
    }

    /// Checks a node in a position that requires `expected`
    fn check(&mut self, expr: &'m Expr, expected: ValueType) {
        if !expr.ty.fits(expected) {
            self.error(
                ErrorCode::TYPE_MISMATCH,
                format!("{} has type {} where {} is required", expr.mnemonic(), expr.ty, expected),
            );
        }
        self.check_node(expr);
    }

    /// Checks that a node's declared type is the one its kind produces
    fn expect_declared(&mut self, expr: &Expr, ty: ValueType) {
        if expr.ty != ty {
            self.error(
                ErrorCode::TYPE_MISMATCH,
                format!("{} is declared {} but produces {}", expr.mnemonic(), expr.ty, ty),
            );
        }
    }

    fn declare_label(&mut self, name: &'m Name, target: Target) {
        if !self.labels.insert(name) {
            self.error(ErrorCode::DUPLICATE_LABEL, format!("label `{}` is used more than once", name));
        }
        self.targets.push((name, target));
    }

    fn check_node(&mut self, expr: &'m Expr) {
        match &expr.kind {
            ExprKind::Block { name, list } => {
                if let Some(name) = name {
                    self.declare_label(name, Target::Block(expr.ty));
                }
                match list.split_last() {
                    Some((last, rest)) => {
                        for child in rest {
                            self.check(child, ValueType::None);
                        }
                        self.check(last, expr.ty);
                    }
                    None => self.expect_declared(expr, ValueType::None),
                }
                if name.is_some() {
                    self.targets.pop();
                }
            }
            ExprKind::Loop { name, body } => {
                if let Some(name) = name {
                    self.declare_label(name, Target::Loop);
                }
                self.check(body, expr.ty);
                if name.is_some() {
                    self.targets.pop();
                }
            }
            ExprKind::If { condition, if_true, if_false } => {
                self.check(condition, ValueType::I32);
                self.check(if_true, expr.ty);
                match if_false {
                    Some(if_false) => self.check(if_false, expr.ty),
                    None => self.expect_declared(expr, ValueType::None),
                }
            }
            ExprKind::Break { name, value, condition } => self.check_break(expr, name, value.as_deref(), condition.as_deref()),
            ExprKind::Call { target, operands } => {
                match self.module.get_function(target) {
                    Some(callee) => self.check_call(expr, &callee.signature(), operands),
                    None => self.error(ErrorCode::UNKNOWN_FUNCTION, format!("call to unknown function `{}`", target)),
                }
            }
            ExprKind::CallImport { target, operands } => {
                match self.module.get_import(target) {
                    Some(import) => self.check_call(expr, &import.signature(), operands),
                    None => self.error(ErrorCode::UNKNOWN_FUNCTION, format!("call to unknown import `{}`", target)),
                }
            }
            ExprKind::CallIndirect { params, target, operands } => {
                if self.module.table.is_none() {
                    self.error(ErrorCode::MISSING_TABLE, "call_indirect in a module without a table".to_string());
                }
                let signature = Signature::new(params.clone(), expr.ty);
                self.check_call(expr, &signature, operands);
                self.check(target, ValueType::I32);
            }
            ExprKind::Const(literal) => self.expect_declared(expr, literal.ty()),
            ExprKind::LocalGet { index } => match self.func.local_type(*index) {
                Some(ty) => self.expect_declared(expr, ty),
                None => self.error(ErrorCode::UNKNOWN_LOCAL, format!("local.get of unknown local {}", index)),
            },
            ExprKind::LocalSet { index, value } => {
                match self.func.local_type(*index) {
                    Some(ty) => self.check(value, ty),
                    None => self.error(ErrorCode::UNKNOWN_LOCAL, format!("local.set of unknown local {}", index)),
                }
                self.expect_declared(expr, ValueType::None);
            }
            ExprKind::Binary { left, right, .. } => {
                if !expr.ty.is_concrete() {
                    self.error(ErrorCode::TYPE_MISMATCH, format!("binary operation cannot produce {}", expr.ty));
                }
                self.check(left, expr.ty);
                self.check(right, expr.ty);
            }
            ExprKind::Select { if_true, if_false, condition } => {
                if !expr.ty.is_concrete() {
                    self.error(ErrorCode::TYPE_MISMATCH, format!("select cannot produce {}", expr.ty));
                }
                self.check(if_true, expr.ty);
                self.check(if_false, expr.ty);
                self.check(condition, ValueType::I32);
            }
            ExprKind::Drop { value } => {
                if value.ty == ValueType::None {
                    self.error(ErrorCode::TYPE_MISMATCH, format!("drop of {} which produces no value", value.mnemonic()));
                }
                self.check_node(value);
                self.expect_declared(expr, ValueType::None);
            }
            ExprKind::Return { value } => {
                let result = self.func.result;
                match value {
                    Some(value) if result.is_concrete() => self.check(value, result),
                    Some(value) => {
                        self.error(ErrorCode::TYPE_MISMATCH, format!("return with a value from a function returning {}", result));
                        self.check_node(value);
                    }
                    None if result.is_concrete() => {
                        self.error(ErrorCode::TYPE_MISMATCH, format!("return without a value from a function returning {}", result));
                    }
                    None => {}
                }
                self.expect_declared(expr, ValueType::Unreachable);
            }
            ExprKind::Nop => self.expect_declared(expr, ValueType::None),
            ExprKind::Unreachable => self.expect_declared(expr, ValueType::Unreachable),
        }
    }

    fn check_break(&mut self, expr: &'m Expr, name: &'m Name, value: Option<&'m Expr>, condition: Option<&'m Expr>) {
        let target = self.targets.iter().rev().find(|(label, _)| *label == name).map(|(_, t)| *t);
        let carried = match target {
            None => {
                self.error(ErrorCode::UNKNOWN_LABEL, format!("branch to unknown label `{}`", name));
                if let Some(value) = value {
                    self.check_node(value);
                }
                None
            }
            Some(Target::Block(ValueType::Unreachable)) => {
                self.error(
                    ErrorCode::TYPE_MISMATCH,
                    format!("branch to `{}` which is declared unreachable", name),
                );
                if let Some(value) = value {
                    self.check_node(value);
                }
                None
            }
            Some(Target::Block(ty)) if ty.is_concrete() => {
                match value {
                    Some(value) => self.check(value, ty),
                    None => self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("branch to `{}` carries no value but the block has type {}", name, ty),
                    ),
                }
                Some(ty)
            }
            Some(Target::Block(_)) | Some(Target::Loop) => {
                if let Some(value) = value {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("branch to `{}` carries a value but the target accepts none", name),
                    );
                    self.check_node(value);
                }
                None
            }
        };

        match condition {
            Some(condition) => {
                self.check(condition, ValueType::I32);
                let falls_through = carried.unwrap_or(ValueType::None);
                if !expr.ty.fits(falls_through) {
                    self.expect_declared(expr, falls_through);
                }
            }
            None => self.expect_declared(expr, ValueType::Unreachable),
        }
    }

    fn check_call(&mut self, expr: &'m Expr, signature: &Signature, operands: &'m [Expr]) {
        if operands.len() != signature.params.len() {
            self.error(
                ErrorCode::ARITY_MISMATCH,
                format!(
                    "{} passes {} arguments but the callee takes {}",
                    expr.mnemonic(),
                    operands.len(),
                    signature.params.len()
                ),
            );
        }
        for (operand, param) in operands.iter().zip(&signature.params) {
            self.check(operand, *param);
        }
        for operand in operands.iter().skip(signature.params.len()) {
            self.check_node(operand);
        }
        self.expect_declared(expr, signature.result);
    }
}
