//! IR Module - high-level structure
//!
//! A module owns its functions, the external functions it imports, and an
//! optional table mapping ordinals to function names for indirect calls.

use crate::expr::Expr;
use crate::types::{Name, ValueType};

/// IR Module - a complete program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: Option<Name>,
    pub functions: Vec<Function>,
    pub imports: Vec<Import>,
    /// Indirect-call table; `None` when the module declares no table
    pub table: Option<Table>,
}

impl Module {
    pub fn new() -> Self {
        Self {
            name: None,
            functions: Vec::new(),
            imports: Vec::new(),
            table: None,
        }
    }

    pub fn named(name: impl Into<Name>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    pub fn add_function(&mut self, func: Function) {
        self.functions.push(func);
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn set_table(&mut self, table: Table) {
        self.table = Some(table);
    }

    /// Finds a function by name
    pub fn get_function(&self, name: &Name) -> Option<&Function> {
        self.functions.iter().find(|f| &f.name == name)
    }

    /// Finds a mutable function by name
    pub fn get_function_mut(&mut self, name: &Name) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| &f.name == name)
    }

    /// Finds an import by name
    pub fn get_import(&self, name: &Name) -> Option<&Import> {
        self.imports.iter().find(|i| &i.name == name)
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

/// Function in IR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: Name,
    pub params: Vec<ValueType>,
    /// Extra locals, indexed after the params
    pub vars: Vec<ValueType>,
    pub result: ValueType,
    pub body: Expr,
}

impl Function {
    pub fn new(name: impl Into<Name>, params: Vec<ValueType>, result: ValueType, body: Expr) -> Self {
        Self {
            name: name.into(),
            params,
            vars: Vec::new(),
            result,
            body,
        }
    }

    pub fn with_vars(mut self, vars: Vec<ValueType>) -> Self {
        self.vars = vars;
        self
    }

    /// Number of addressable locals (params first, then vars)
    pub fn num_locals(&self) -> usize {
        self.params.len() + self.vars.len()
    }

    /// Type of local `index`
    pub fn local_type(&self, index: u32) -> Option<ValueType> {
        let index = index as usize;
        self.params
            .get(index)
            .or_else(|| self.vars.get(index.checked_sub(self.params.len())?))
            .copied()
    }

    /// All local types (params first, then vars)
    pub fn local_types(&self) -> Vec<ValueType> {
        self.params.iter().chain(&self.vars).copied().collect()
    }

    pub fn signature(&self) -> Signature {
        Signature::new(self.params.clone(), self.result)
    }
}

/// Imported external function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: Name,
    /// External module name
    pub module: String,
    /// Field name inside the external module
    pub base: String,
    pub params: Vec<ValueType>,
    pub result: ValueType,
}

impl Import {
    pub fn new(
        name: impl Into<Name>,
        module: impl Into<String>,
        base: impl Into<String>,
        params: Vec<ValueType>,
        result: ValueType,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            base: base.into(),
            params,
            result,
        }
    }

    pub fn signature(&self) -> Signature {
        Signature::new(self.params.clone(), self.result)
    }
}

/// Indirect-call table: ordinal -> function name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub names: Vec<Name>,
}

impl Table {
    pub fn new(names: Vec<Name>) -> Self {
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Parameter and result types of a callable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<ValueType>,
    pub result: ValueType,
}

impl Signature {
    pub fn new(params: Vec<ValueType>, result: ValueType) -> Self {
        Self { params, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    #[test]
    fn test_function_locals() {
        let func = Function::new("add", vec![ValueType::I32, ValueType::I64], ValueType::I32, Builder::nop())
            .with_vars(vec![ValueType::F64]);

        assert_eq!(func.num_locals(), 3);
        assert_eq!(func.local_type(0), Some(ValueType::I32));
        assert_eq!(func.local_type(1), Some(ValueType::I64));
        assert_eq!(func.local_type(2), Some(ValueType::F64));
        assert_eq!(func.local_type(3), None);
        assert_eq!(func.local_types(), vec![ValueType::I32, ValueType::I64, ValueType::F64]);
    }

    #[test]
    fn test_module_lookup() {
        let mut module = Module::named("test");
        module.add_function(Function::new("main", vec![], ValueType::None, Builder::nop()));
        module.add_import(Import::new("log", "env", "log", vec![ValueType::I32], ValueType::None));
        module.set_table(Table::new(vec![Name::from("main")]));

        assert!(module.get_function(&Name::from("main")).is_some());
        assert!(module.get_function(&Name::from("log")).is_none());
        assert_eq!(module.get_import(&Name::from("log")).map(|i| i.base.as_str()), Some("log"));
        assert_eq!(module.table.as_ref().map(Table::len), Some(1));
    }
}
