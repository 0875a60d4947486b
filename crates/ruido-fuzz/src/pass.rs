//! Mutation driver
//!
//! Walks every function body once, children before parents, and replaces
//! each visited node with probability `replace_chance` by a synthesized
//! subtree of the same static type. Labeled blocks and loops of the input
//! are kept as branch anchors: their contents may change but the nodes
//! themselves, and so their labels, survive.

use serde::Serialize;
use ruido_ir::{walk_expr, Builder, Expr, Function, Module, Visitor};

use crate::config::FuzzConfig;
use crate::noise::Noise;
use crate::scope::Scope;
use crate::synth::{ModuleContext, Synthesizer};

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FuzzStats {
    pub functions: usize,
    pub visited: usize,
    pub replaced: usize,
    pub budget_spent: u64,
    /// Functions whose budget ran out
    pub exhausted: Vec<String>,
}

/// Counters for a single function
#[derive(Debug, Clone, Copy, Default)]
struct FunctionStats {
    visited: usize,
    replaced: usize,
    spent: u32,
    exhausted: bool,
}

pub struct FuzzPass {
    config: FuzzConfig,
    noise: Noise,
}

impl FuzzPass {
    pub fn new(config: FuzzConfig) -> Self {
        Self {
            config,
            noise: Noise::new(config.seed),
        }
    }

    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    /// Mutates every function body of `module` in place
    pub fn run(&mut self, module: &mut Module) -> FuzzStats {
        let context = ModuleContext::new(module);
        let mut stats = FuzzStats::default();

        for func in &mut module.functions {
            let func_stats = self.run_function(&context, func);
            tracing::debug!(
                function = %func.name,
                visited = func_stats.visited,
                replaced = func_stats.replaced,
                spent = func_stats.spent,
                "fuzzed function"
            );
            if func_stats.exhausted {
                tracing::trace!(function = %func.name, "budget exhausted");
                stats.exhausted.push(func.name.as_str().to_string());
            }
            stats.functions += 1;
            stats.visited += func_stats.visited;
            stats.replaced += func_stats.replaced;
            stats.budget_spent += u64::from(func_stats.spent);
        }

        tracing::info!(
            functions = stats.functions,
            replaced = stats.replaced,
            seed = self.config.seed,
            "fuzz pass finished"
        );
        stats
    }

    fn run_function(&mut self, context: &ModuleContext, func: &mut Function) -> FunctionStats {
        let mut body = std::mem::replace(&mut func.body, Builder::nop());
        let mut mutator = Mutator {
            synth: Synthesizer::new(context, &mut self.noise, self.config, func.local_types(), func.result),
            replace_chance: self.config.replace_chance,
            stats: FunctionStats::default(),
        };
        mutator.synth.scan(&body);

        walk_expr(&mut mutator, &mut body);
        assert!(mutator.synth.scopes.is_empty(), "unbalanced scopes in `{}`", func.name);

        let mut stats = mutator.stats;
        stats.spent = mutator.synth.budget().spent();
        stats.exhausted = mutator.synth.budget().exhausted();
        func.body = body;
        stats
    }
}

/// Visitor replacing nodes of one function body
struct Mutator<'a> {
    synth: Synthesizer<'a>,
    replace_chance: u32,
    stats: FunctionStats,
}

impl Visitor for Mutator<'_> {
    fn enter_scope(&mut self, scope: &Expr) {
        if let Some(scope) = Scope::of(scope) {
            self.synth.enter(scope);
        }
    }

    fn exit_scope(&mut self, _scope: &Expr) {
        self.synth.exit();
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        self.stats.visited += 1;
        // Anchors stay so branches inside them keep a target
        if expr.label().is_some() {
            return;
        }
        if self.synth.noise().chance(self.replace_chance) {
            *expr = self.synth.synthesize(expr.ty);
            self.stats.replaced += 1;
        }
    }
}

/// Runs a fresh pass over `module`
pub fn fuzz_module(module: &mut Module, config: &FuzzConfig) -> FuzzStats {
    FuzzPass::new(*config).run(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruido_ir::{validate_module, ExprKind, Literal, Name, ValueType};

    fn sample() -> Module {
        let mut module = Module::named("sample");
        let body = Builder::block_typed(
            Some(Name::from("out")),
            vec![
                Builder::local_set(1, Builder::constant(Literal::I64(4))),
                Builder::drop(Builder::br_if(Name::from("out"), Some(Builder::local_get(0, ValueType::I32)), Builder::local_get(0, ValueType::I32))),
                Builder::make_loop(Some(Name::from("spin")), Builder::nop()),
                Builder::constant(Literal::I32(3)),
            ],
            ValueType::I32,
        );
        module.add_function(Function::new("main", vec![ValueType::I32], ValueType::I32, body).with_vars(vec![ValueType::I64]));
        module.add_function(Function::new("side", vec![], ValueType::None, Builder::nop()));
        module
    }

    #[test]
    fn test_zero_chance_is_identity() {
        let mut module = sample();
        let stats = fuzz_module(&mut module, &FuzzConfig::default().with_replace_chance(0));
        assert_eq!(module, sample());
        assert_eq!(stats.functions, 2);
        assert_eq!(stats.replaced, 0);
        assert_eq!(stats.visited, sample().functions.iter().map(|f| f.body.node_count()).sum::<usize>());
    }

    #[test]
    fn test_full_chance_keeps_anchors() {
        let mut module = sample();
        let config = FuzzConfig::default().with_replace_chance(100).with_budget(200);
        fuzz_module(&mut module, &config);

        let body = &module.functions[0].body;
        assert_eq!(body.label(), Some(&Name::from("out")));
        assert_eq!(body.ty, ValueType::I32);
        let ExprKind::Block { list, .. } = &body.kind else {
            panic!("anchor block was replaced");
        };
        assert_eq!(list.len(), 4);
        assert_eq!(list[2].label(), Some(&Name::from("spin")));
        assert!(validate_module(&module).is_empty(), "{}", validate_module(&module));
    }

    #[test]
    fn test_same_seed_same_module() {
        let config = FuzzConfig::default().with_seed(77).with_replace_chance(40).with_budget(150);
        let mut first = sample();
        let mut second = sample();
        let stats_a = fuzz_module(&mut first, &config);
        let stats_b = fuzz_module(&mut second, &config);
        assert_eq!(first, second);
        assert_eq!(stats_a, stats_b);
    }

    #[test]
    fn test_stats_serialize() {
        let mut module = sample();
        let stats = fuzz_module(&mut module, &FuzzConfig::default().with_replace_chance(100).with_budget(1));
        assert_eq!(stats.exhausted, vec!["main".to_string(), "side".to_string()]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["functions"], 2);
        assert!(json["exhausted"].is_array());
    }
}
