//! Integration tests for the ruido IR fuzzer
//!
//! This crate drives the complete pipeline end to end:
//! Source → Lexer → Parser → Validator → Fuzz pass → Printer

use std::collections::HashSet;

use ruido_error::{Diagnostics, ErrorCode};
use ruido_fuzz::{fuzz_module, FuzzConfig, FuzzStats};
use ruido_ir::{for_each_expr, validate_module, Expr, Module, Name};
use ruido_parser::parse_source;

/// A module with imports, a table, loops and branches of every shape
pub const SAMPLE: &str = r#"
(module $sample
  (import $log "env" "log" (param i32))
  (import $clock "env" "clock" (result f64))
  (table $add $count $add)
  (func $add (param i32 i32) (result i32)
    (i32.add (local.get 0) (local.get 1)))
  (func $count (param i32) (local i64) (result i32)
    (block $done (result i32)
      (loop $again
        (block $step
          (local.set 1 (i64.add (local.get 1) (i64.const 1)))
          (drop (br_if $done (local.get 0) (i32.const 0)))
          (br_if $again (local.get 0))))
      (call $add (local.get 0) (i32.const 1))))
  (func $mix (param f32) (result f64)
    (call_import $log
      (call_indirect (param i32 i32) (result i32) (i32.const 2) (i32.const 3) (i32.const 0)))
    (if (result f64) (i32.const 1)
      (call_import $clock)
      (f64.mul (f64.const 2.5) (f64.const -1.0))))
  (func $main
    (nop)
    (drop (select (i64.const 1) (i64.const 2) (i32.const 1)))
    (return)))
"#;

/// Labeled anchors without branches of their own and a table of `i32`
/// functions: every branch or indirect call in a fuzzed copy is synthesized
pub const ANCHORED: &str = r#"
(module $anchored
  (table $pick $pick)
  (func $pick (param i32) (result i32)
    (block $exit (result i32)
      (loop $again
        (block $step
          (nop)
          (drop (local.get 0))
          (nop)))
      (local.get 0))))
"#;

/// Result of fuzzing a source module
#[derive(Debug)]
pub struct FuzzResult {
    pub module: Module,
    pub stats: FuzzStats,
    /// Validation of the fuzzed module
    pub diagnostics: Diagnostics,
}

/// Parses and validates source text
pub fn load_module(source: &str) -> Result<Module, Diagnostics> {
    let (module, mut diagnostics) = parse_source(source, 0);
    if !diagnostics.has_errors() {
        diagnostics.extend(validate_module(&module));
    }
    if diagnostics.has_errors() {
        Err(diagnostics)
    } else {
        Ok(module)
    }
}

/// Parses `source`, fuzzes it with `config` and validates the result
pub fn fuzz_source(source: &str, config: &FuzzConfig) -> FuzzResult {
    let mut module = load_module(source).unwrap_or_else(|d| panic!("input does not load:\n{}", d));
    let stats = fuzz_module(&mut module, config);
    let diagnostics = validate_module(&module);
    FuzzResult { module, stats, diagnostics }
}

/// Asserts that a module passes validation
pub fn assert_valid(module: &Module) {
    let diagnostics = validate_module(module);
    if !diagnostics.is_empty() {
        panic!("Expected a valid module, but got:\n{}\n\n{}", diagnostics, module);
    }
}

/// Asserts that source text is rejected with the given code
pub fn assert_rejected(source: &str, code: ErrorCode) {
    match load_module(source) {
        Ok(_) => panic!("Expected {} but the module loaded", code),
        Err(diagnostics) => assert!(
            diagnostics.has_code(code),
            "Expected {} but got:\n{}",
            code,
            diagnostics
        ),
    }
}

/// Every label declared in `expr`, in pre-order
pub fn labels(expr: &Expr) -> Vec<Name> {
    let mut found = Vec::new();
    for_each_expr(expr, &mut |e| {
        if let Some(label) = e.label() {
            found.push(label.clone());
        }
    });
    found
}

/// Asserts that no function declares a label twice
pub fn assert_unique_labels(module: &Module) {
    for func in &module.functions {
        let all = labels(&func.body);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len(), "duplicate label in `{}`", func.name);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use ruido_ir::{Builder, ExprKind, Function, ValueType};

    fn config(seed: u64) -> FuzzConfig {
        FuzzConfig::default().with_seed(seed).with_replace_chance(25).with_budget(200)
    }

    #[test]
    fn test_fuzzed_modules_stay_valid() {
        for seed in 0..60 {
            let result = fuzz_source(SAMPLE, &config(seed));
            assert!(result.diagnostics.is_empty(), "seed {}:\n{}\n\n{}", seed, result.diagnostics, result.module);
        }
    }

    #[test]
    fn test_signatures_and_types_preserved() {
        let original = load_module(SAMPLE).unwrap();
        for seed in 0..30 {
            let result = fuzz_source(SAMPLE, &config(seed));
            for (before, after) in original.functions.iter().zip(&result.module.functions) {
                assert_eq!(before.signature(), after.signature());
                assert_eq!(before.vars, after.vars);
                assert!(after.body.ty.fits(before.body.ty) || after.body.ty.fits(before.result));
            }
            assert_eq!(result.module.imports, original.imports);
            assert_eq!(result.module.table, original.table);
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let first = fuzz_source(SAMPLE, &config(99));
        let second = fuzz_source(SAMPLE, &config(99));
        assert_eq!(first.module.to_string(), second.module.to_string());
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_seeds_diverge() {
        let base = fuzz_source(SAMPLE, &config(0)).module.to_string();
        let differing = (1..10)
            .filter(|seed| fuzz_source(SAMPLE, &config(*seed)).module.to_string() != base)
            .count();
        assert!(differing > 0);
    }

    #[test]
    fn test_budget_bounds_spending() {
        for seed in 0..20 {
            let budget = 80;
            let cfg = config(seed).with_replace_chance(100).with_budget(budget);
            let result = fuzz_source(SAMPLE, &cfg);
            assert!(result.stats.budget_spent <= u64::from(budget) * result.stats.functions as u64);
            assert_valid(&result.module);
        }
    }

    #[test]
    fn test_labels_unique_after_fuzzing() {
        for seed in 0..40 {
            let result = fuzz_source(SAMPLE, &config(seed).with_replace_chance(60));
            assert_unique_labels(&result.module);
        }
    }

    #[test]
    fn test_original_anchors_survive() {
        for seed in 0..20 {
            let result = fuzz_source(SAMPLE, &config(seed).with_replace_chance(100));
            let count = &result.module.functions[1];
            let found = labels(&count.body);
            for label in ["done", "again", "step"] {
                assert!(found.iter().any(|l| l == label), "seed {}: lost ${}", seed, label);
            }
        }
    }

    #[test]
    fn test_synthesized_branches_and_indirect_calls() {
        let anchors = ["exit", "again", "step"];
        let (mut to_synthesized, mut to_anchor, mut indirect) = (0, 0, 0);
        for seed in 0..40 {
            let config = FuzzConfig::default().with_seed(seed).with_replace_chance(100).with_budget(300);
            let result = fuzz_source(ANCHORED, &config);
            assert_valid(&result.module);
            for_each_expr(&result.module.functions[0].body, &mut |expr| match &expr.kind {
                ExprKind::Break { name, .. } if name.as_str().starts_with("fuzz$") => to_synthesized += 1,
                ExprKind::Break { name, .. } if anchors.contains(&name.as_str()) => to_anchor += 1,
                ExprKind::Break { name, .. } => panic!("seed {}: branch to unknown `{}`", seed, name),
                ExprKind::CallIndirect { .. } => indirect += 1,
                _ => {}
            });
        }
        assert!(to_synthesized > 0, "no branch to a synthesized label");
        assert!(to_anchor > 0, "no branch to an original label");
        assert!(indirect > 0, "no indirect call");
    }

    #[test]
    fn test_budget_of_one_gives_unreachable() {
        // Single function, no other callees and no table
        let mut module = Module::new();
        module.add_function(Function::new("f", vec![], ValueType::I32, Builder::constant(ruido_ir::Literal::I32(7))));
        let config = FuzzConfig::default().with_budget(1).with_replace_chance(100).with_unreachable_chance(0);
        for seed in 0..10 {
            let mut copy = module.clone();
            fuzz_module(&mut copy, &config.with_seed(seed));
            assert_eq!(copy.functions[0].body, Builder::unreachable());
        }
    }

    #[test]
    fn test_full_replacement_inside_labeled_block() {
        let source = "(module (func $f (param i32) (result i32)
            (block $keep (result i32) (nop) (drop (local.get 0)) (local.get 0))))";
        let config = FuzzConfig::default().with_replace_chance(100).with_budget(300);
        let result = fuzz_source(source, &config);
        assert_valid(&result.module);

        let body = &result.module.functions[0].body;
        assert_eq!(body.label().map(|l| l.as_str()), Some("keep"));
        assert_eq!(body.ty, ValueType::I32);
        // nop, drop, its local.get and the trailing local.get
        assert_eq!(result.stats.replaced, 4);
        assert_eq!(result.stats.visited, 5);
        let ExprKind::Block { list, .. } = &body.kind else {
            panic!("labeled block was replaced");
        };
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_stats_json() {
        let result = fuzz_source(SAMPLE, &config(5));
        let json = serde_json::to_value(&result.stats).unwrap();
        assert_eq!(json["functions"], 4);
        assert_eq!(json["visited"].as_u64(), Some(result.stats.visited as u64));
    }
}
