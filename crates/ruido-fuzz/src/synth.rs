//! Type-directed expression synthesis
//!
//! [`Synthesizer::synthesize`] builds a random subtree whose static type
//! fits a required type. Every node kind is built only when the module and
//! the enclosing scopes offer a witness for it; otherwise the divergent
//! `unreachable` node is returned, which fits anywhere. Each attempt
//! consumes one unit of the function's budget, so synthesis always ends.

use ruido_ir::{Builder, Expr, Module, Name, Signature, ValueType};

use crate::budget::Budget;
use crate::config::FuzzConfig;
use crate::names::NameRegistry;
use crate::noise::Noise;
use crate::scope::{Scope, ScopeStack};

/// Signatures the synthesizer may call, captured once per module
#[derive(Debug, Clone, Default)]
pub struct ModuleContext {
    functions: Vec<(Name, Signature)>,
    imports: Vec<(Name, Signature)>,
    /// Resolved table entries; duplicates are kept
    table: Vec<Signature>,
}

impl ModuleContext {
    pub fn new(module: &Module) -> Self {
        let functions = module.functions.iter().map(|f| (f.name.clone(), f.signature())).collect();
        let imports = module.imports.iter().map(|i| (i.name.clone(), i.signature())).collect();
        let table = module
            .table
            .iter()
            .flat_map(|table| &table.names)
            .filter_map(|name| module.get_function(name))
            .map(|f| f.signature())
            .collect();
        Self { functions, imports, table }
    }

    fn functions_returning(&self, ty: ValueType) -> Vec<&(Name, Signature)> {
        self.functions.iter().filter(|(_, sig)| sig.result == ty).collect()
    }

    fn imports_returning(&self, ty: ValueType) -> Vec<&(Name, Signature)> {
        self.imports.iter().filter(|(_, sig)| sig.result == ty).collect()
    }

    fn table_returning(&self, ty: ValueType) -> Vec<&Signature> {
        self.table.iter().filter(|sig| sig.result == ty).collect()
    }
}

/// Node kinds the synthesizer can build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthKind {
    Block,
    If,
    Loop,
    Break,
    Call,
    CallImport,
    CallIndirect,
    /// `nop`, `drop` of a constant or a `select`, `local.set` of a
    /// constant, or `return`
    Leaf,
}

impl SynthKind {
    const VALUED: [SynthKind; 7] = [
        SynthKind::Block,
        SynthKind::If,
        SynthKind::Loop,
        SynthKind::Break,
        SynthKind::Call,
        SynthKind::CallImport,
        SynthKind::CallIndirect,
    ];

    const VALUELESS: [SynthKind; 8] = [
        SynthKind::Block,
        SynthKind::If,
        SynthKind::Loop,
        SynthKind::Break,
        SynthKind::Call,
        SynthKind::CallImport,
        SynthKind::CallIndirect,
        SynthKind::Leaf,
    ];

    const DIVERGENT: [SynthKind; 4] = [SynthKind::Block, SynthKind::If, SynthKind::Loop, SynthKind::Break];

    /// Kinds that may produce a node fitting `ty`
    pub fn eligible(ty: ValueType) -> &'static [SynthKind] {
        match ty {
            ValueType::I32 | ValueType::I64 | ValueType::F32 | ValueType::F64 => &Self::VALUED,
            ValueType::None => &Self::VALUELESS,
            ValueType::Unreachable => &Self::DIVERGENT,
        }
    }
}

/// Synthesis state for one function
pub struct Synthesizer<'a> {
    context: &'a ModuleContext,
    noise: &'a mut Noise,
    config: FuzzConfig,
    pub(crate) budget: Budget,
    pub(crate) scopes: ScopeStack,
    names: NameRegistry,
    /// Parameter and local types of the function
    locals: Vec<ValueType>,
    /// Result type of the function, for `return` leaves
    result: ValueType,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        context: &'a ModuleContext,
        noise: &'a mut Noise,
        config: FuzzConfig,
        locals: Vec<ValueType>,
        result: ValueType,
    ) -> Self {
        Self {
            context,
            noise,
            config,
            budget: Budget::new(config.budget),
            scopes: ScopeStack::new(),
            names: NameRegistry::new(),
            locals,
            result,
        }
    }

    /// Records the labels already present in the function body
    pub fn scan(&mut self, body: &Expr) {
        self.names.scan(body);
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// The shared decision source
    pub fn noise(&mut self) -> &mut Noise {
        &mut *self.noise
    }

    /// Enters a scope of the tree being walked
    pub fn enter(&mut self, scope: Scope) {
        self.scopes.enter(scope);
    }

    pub fn exit(&mut self) {
        self.scopes.exit();
    }

    /// Builds a random subtree whose type fits `ty`
    pub fn synthesize(&mut self, ty: ValueType) -> Expr {
        if !self.budget.consume() {
            return Builder::unreachable();
        }
        if self.noise.chance(self.config.unreachable_chance) {
            return Builder::unreachable();
        }
        match *self.noise.choose(SynthKind::eligible(ty)) {
            SynthKind::Block => self.make_block(ty),
            SynthKind::If => self.make_if(ty),
            SynthKind::Loop => self.make_loop(ty),
            SynthKind::Break => self.make_break(ty),
            SynthKind::Call => self.make_call(ty),
            SynthKind::CallImport => self.make_call_import(ty),
            SynthKind::CallIndirect => self.make_call_indirect(ty),
            SynthKind::Leaf => self.make_leaf(),
        }
    }

    /// Runs `build` with `scope` pushed; the scope is popped afterwards
    fn scoped<T>(&mut self, scope: Scope, build: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.enter(scope);
        let built = build(self);
        self.scopes.exit();
        built
    }

    fn make_block(&mut self, ty: ValueType) -> Expr {
        let label = self.names.allocate();
        let len = self.noise.pick(self.config.max_block_len.max(1) as usize) + 1;
        let list: Vec<Expr> = self.scoped(Scope::block(label.clone(), ty), |s| {
            (0..len)
                .map(|i| s.synthesize(if i + 1 == len { ty } else { ValueType::None }))
                .collect()
        });
        Builder::block_typed(Some(label), list, ty)
    }

    fn make_loop(&mut self, ty: ValueType) -> Expr {
        let label = self.names.allocate();
        let body = self.scoped(Scope::looping(label.clone()), |s| s.synthesize(ty));
        Builder::loop_typed(Some(label), body, ty)
    }

    fn make_if(&mut self, ty: ValueType) -> Expr {
        let condition = self.synthesize(ValueType::I32);
        let if_true = self.synthesize(ty);
        let if_false = self.synthesize(ty);
        Builder::if_typed(condition, if_true, Some(if_false), ty)
    }

    fn make_break(&mut self, ty: ValueType) -> Expr {
        let conditional = ty != ValueType::Unreachable && self.noise.chance(50);
        if !conditional {
            let targets = self.scopes.all_targets();
            if targets.is_empty() {
                return Builder::unreachable();
            }
            let target = (*self.noise.choose(&targets)).clone();
            let value = target.carried().map(|carried| self.synthesize(carried));
            return Builder::br(target.label, value);
        }

        let carried = Some(ty).filter(|ty| ty.is_concrete());
        let targets = self.scopes.eligible_targets(carried);
        if targets.is_empty() {
            return Builder::unreachable();
        }
        let label = self.noise.choose(&targets).label.clone();
        let value = carried.map(|carried| self.synthesize(carried));
        let condition = self.synthesize(ValueType::I32);
        Builder::br_if(label, value, condition)
    }

    fn arguments(&mut self, params: &[ValueType]) -> Vec<Expr> {
        params.iter().map(|param| self.synthesize(*param)).collect()
    }

    fn make_call(&mut self, ty: ValueType) -> Expr {
        let context = self.context;
        let candidates = context.functions_returning(ty);
        if candidates.is_empty() {
            return Builder::unreachable();
        }
        let (name, signature) = *self.noise.choose(&candidates);
        let operands = self.arguments(&signature.params);
        Builder::call(name.clone(), operands, ty)
    }

    fn make_call_import(&mut self, ty: ValueType) -> Expr {
        let context = self.context;
        let candidates = context.imports_returning(ty);
        if candidates.is_empty() {
            return Builder::unreachable();
        }
        let (name, signature) = *self.noise.choose(&candidates);
        let operands = self.arguments(&signature.params);
        Builder::call_import(name.clone(), operands, ty)
    }

    fn make_call_indirect(&mut self, ty: ValueType) -> Expr {
        let context = self.context;
        let candidates = context.table_returning(ty);
        if candidates.is_empty() {
            return Builder::unreachable();
        }
        let signature = *self.noise.choose(&candidates);
        let operands = self.arguments(&signature.params);
        let target = self.synthesize(ValueType::I32);
        Builder::call_indirect(signature.params.clone(), ty, target, operands)
    }

    /// A leaf fitting `none`; `return` diverges, which fits as well
    fn make_leaf(&mut self) -> Expr {
        match self.noise.pick(5) {
            0 => Builder::nop(),
            1 => {
                let ty = *self.noise.choose(&ValueType::CONCRETE);
                Builder::drop(self.make_const(ty))
            }
            2 => {
                if self.locals.is_empty() {
                    return Builder::nop();
                }
                let index = self.noise.pick(self.locals.len());
                let value = self.make_const(self.locals[index]);
                Builder::local_set(index as u32, value)
            }
            3 => {
                let ty = *self.noise.choose(&ValueType::CONCRETE);
                let select = self.make_select(ty);
                // both arms fell back: a select cannot be typed `unreachable`
                if !select.ty.is_concrete() {
                    return Builder::unreachable();
                }
                Builder::drop(select)
            }
            _ => {
                let result = self.result;
                let value = result.is_concrete().then(|| self.make_const(result));
                Builder::ret(value)
            }
        }
    }

    /// `select` over two constants of `ty` and a constant condition
    fn make_select(&mut self, ty: ValueType) -> Expr {
        if !self.budget.consume() {
            return Builder::unreachable();
        }
        let if_true = self.make_const(ty);
        let if_false = self.make_const(ty);
        let condition = self.make_const(ValueType::I32);
        Builder::select(if_true, if_false, condition)
    }

    fn make_const(&mut self, ty: ValueType) -> Expr {
        if !self.budget.consume() {
            return Builder::unreachable();
        }
        match self.noise.literal(ty) {
            Some(literal) => Builder::constant(literal),
            None => Builder::unreachable(),
        }
    }
}
