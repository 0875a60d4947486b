//! Parser for the ruido IR text format
//!
//! Converts a sequence of tokens into an IR module using recursive descent.
//!
//! ```text
//! module := '(' 'module' NAME? item* ')'
//! item   := '(' 'import' NAME STRING STRING params? result? ')'
//!         | '(' 'table' NAME* ')'
//!         | '(' 'func' NAME params? locals? result? expr* ')'
//! expr   := '(' head ... ')'
//! ```
//!
//! Function headers are read before any body so that calls can be typed
//! no matter where the callee is declared.

use std::collections::HashMap;

use ruido_error::{Diagnostic, Diagnostics, ErrorCode, Span};
use ruido_ir::{BinaryOp, Builder, Expr, Function, Import, Literal, Module, Name, Signature, Table, ValueType};
use ruido_lexer::{Token, TokenKind};

/// A function whose header has been read and whose body is pending
struct PendingFunction {
    name: Name,
    params: Vec<ValueType>,
    vars: Vec<ValueType>,
    result: ValueType,
    /// Token index of the first body expression
    body_start: usize,
}

/// Parser for the ruido IR text format
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Diagnostics,
    /// Signatures of the module's functions
    functions: HashMap<Name, Signature>,
    /// Signatures of the module's imports
    imports: HashMap<Name, Signature>,
    /// Local types of the function being parsed
    locals: Vec<ValueType>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| !t.is_eof()) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: Diagnostics::new(),
            functions: HashMap::new(),
            imports: HashMap::new(),
            locals: Vec::new(),
        }
    }

    /// Returns the diagnostics
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Consumes and returns the diagnostics
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    // =========================================
    // Helpers
    // =========================================

    fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().is(kind)
    }

    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    /// Consumes the current token; Eof is never consumed
    fn advance(&mut self) -> &Token {
        if self.is_at_end() {
            return self.peek();
        }
        self.pos += 1;
        &self.tokens[self.pos - 1]
    }

    /// Checks for `(keyword` at the current position
    fn at_clause(&self, keyword: &str) -> bool {
        self.check(&TokenKind::LParen) && self.peek_next().is_atom(keyword)
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error_at_current(message, ErrorCode::UNEXPECTED_TOKEN);
            Err(())
        }
    }

    fn expect_atom(&mut self, word: &str) -> Result<(), ()> {
        if self.peek().is_atom(word) {
            self.advance();
            Ok(())
        } else {
            self.error_at_current(&format!("expected `{}`", word), ErrorCode::UNEXPECTED_TOKEN);
            Err(())
        }
    }

    fn expect_name(&mut self) -> Result<Name, ()> {
        match &self.peek().kind {
            TokenKind::Name(name) => {
                let name = Name::new(name.clone());
                self.advance();
                Ok(name)
            }
            _ => {
                self.error_at_current("expected a `$name`", ErrorCode::UNEXPECTED_TOKEN);
                Err(())
            }
        }
    }

    fn optional_name(&mut self) -> Option<Name> {
        match &self.peek().kind {
            TokenKind::Name(name) => {
                let name = Name::new(name.clone());
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    fn error_at_current(&mut self, message: &str, code: ErrorCode) {
        let span = self.peek().span;
        let found = self.peek().kind.to_string();
        self.error_at(span, message, code, format!("found: {}", found));
    }

    fn error_at(&mut self, span: Span, message: &str, code: ErrorCode, label: String) {
        self.diagnostics.push(Diagnostic::error(message).with_code(code).with_label(span, label));
    }

    /// Skips one balanced parenthesized group starting at the current `(`
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return;
            }
        }
    }

    // =========================================
    // Types
    // =========================================

    fn parse_type(&mut self) -> Result<ValueType, ()> {
        let ty = self.peek().kind.as_atom().and_then(ValueType::from_name);
        match ty {
            Some(ty) => {
                self.advance();
                Ok(ty)
            }
            None => {
                self.error_at_current("expected a type", ErrorCode::EXPECTED_TYPE);
                Err(())
            }
        }
    }

    /// Parses `(keyword T*)` if present
    fn parse_type_clause(&mut self, keyword: &str) -> Result<Vec<ValueType>, ()> {
        let mut types = Vec::new();
        while self.at_clause(keyword) {
            self.advance();
            self.advance();
            while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                types.push(self.parse_type()?);
            }
            self.expect(&TokenKind::RParen, "expected `)` after types")?;
        }
        Ok(types)
    }

    /// Parses `(result T)` if present
    fn parse_result(&mut self) -> Result<Option<ValueType>, ()> {
        if !self.at_clause("result") {
            return Ok(None);
        }
        let start = self.peek().span;
        let types = self.parse_type_clause("result")?;
        match types.as_slice() {
            [ty] => Ok(Some(*ty)),
            _ => {
                self.error_at(start, "expected exactly one result type", ErrorCode::EXPECTED_TYPE, "here".to_string());
                Err(())
            }
        }
    }

    // =========================================
    // Module items
    // =========================================

    /// Parses a whole module
    pub fn parse_module(&mut self) -> Module {
        let mut module = Module::new();
        if self.expect(&TokenKind::LParen, "expected `(module`").is_err() || self.expect_atom("module").is_err() {
            return module;
        }
        module.name = self.optional_name();

        let mut pending = Vec::new();
        while self.check(&TokenKind::LParen) {
            let item_start = self.pos;
            let ok = match self.peek_next().kind.as_atom() {
                Some("import") => self.parse_import(&mut module),
                Some("table") => self.parse_table(&mut module),
                Some("func") => self.parse_function_header().map(|f| pending.push(f)),
                _ => {
                    self.advance();
                    self.error_at_current("expected `import`, `table` or `func`", ErrorCode::UNEXPECTED_TOKEN);
                    Err(())
                }
            };
            if ok.is_err() || self.pos == item_start {
                self.pos = item_start;
                self.skip_balanced();
            }
        }

        if self.expect(&TokenKind::RParen, "expected `)` to close the module").is_ok() && !self.is_at_end() {
            self.error_at_current("unexpected tokens after the module", ErrorCode::UNEXPECTED_TOKEN);
        }

        for func in pending {
            self.pos = func.body_start;
            self.locals = func.params.iter().chain(&func.vars).copied().collect();
            let Some(body) = self.parse_body() else {
                continue;
            };
            module.add_function(Function::new(func.name, func.params, func.result, body).with_vars(func.vars));
        }
        module
    }

    fn parse_import(&mut self, module: &mut Module) -> Result<(), ()> {
        self.advance();
        self.expect_atom("import")?;
        let span = self.peek().span;
        let name = self.expect_name()?;
        let external = self.parse_string()?;
        let base = self.parse_string()?;
        let params = self.parse_type_clause("param")?;
        let result = self.parse_result()?.unwrap_or(ValueType::None);
        self.expect(&TokenKind::RParen, "expected `)` to close the import")?;

        if self.imports.contains_key(&name) || self.functions.contains_key(&name) {
            self.error_at(span, &format!("`{}` is defined more than once", name), ErrorCode::DUPLICATE_DEFINITION, "redefined here".to_string());
        }
        self.imports.insert(name.clone(), Signature::new(params.clone(), result));
        module.add_import(Import::new(name, external, base, params, result));
        Ok(())
    }

    fn parse_string(&mut self) -> Result<String, ()> {
        match &self.peek().kind {
            TokenKind::Str(text) => {
                let text = text.clone();
                self.advance();
                Ok(text)
            }
            _ => {
                self.error_at_current("expected a string", ErrorCode::UNEXPECTED_TOKEN);
                Err(())
            }
        }
    }

    fn parse_table(&mut self, module: &mut Module) -> Result<(), ()> {
        self.advance();
        self.expect_atom("table")?;
        let mut names = Vec::new();
        while let Some(name) = self.optional_name() {
            names.push(name);
        }
        self.expect(&TokenKind::RParen, "expected `)` to close the table")?;
        module.set_table(Table::new(names));
        Ok(())
    }

    /// Reads a function header and skips its body for now
    fn parse_function_header(&mut self) -> Result<PendingFunction, ()> {
        let item_start = self.pos;
        self.advance();
        self.expect_atom("func")?;
        let span = self.peek().span;
        let name = self.expect_name()?;
        let params = self.parse_type_clause("param")?;
        let vars = self.parse_type_clause("local")?;
        let result = self.parse_result()?.unwrap_or(ValueType::None);
        let body_start = self.pos;

        if self.functions.contains_key(&name) || self.imports.contains_key(&name) {
            self.error_at(span, &format!("`{}` is defined more than once", name), ErrorCode::DUPLICATE_DEFINITION, "redefined here".to_string());
        }
        self.functions.insert(name.clone(), Signature::new(params.clone(), result));

        self.pos = item_start;
        self.skip_balanced();
        Ok(PendingFunction { name, params, vars, result, body_start })
    }

    /// Parses body expressions up to the function's `)`
    fn parse_body(&mut self) -> Option<Expr> {
        let mut list = self.parse_exprs().ok()?;
        self.expect(&TokenKind::RParen, "expected `)` to close the function").ok()?;
        Some(match list.len() {
            0 => Builder::nop(),
            1 => list.remove(0),
            _ => Builder::block(None, list),
        })
    }

    // =========================================
    // Expressions
    // =========================================

    fn parse_exprs(&mut self) -> Result<Vec<Expr>, ()> {
        let mut list = Vec::new();
        while self.check(&TokenKind::LParen) {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    /// Parses exactly `min..=max` child expressions
    fn parse_operands(&mut self, head: &str, span: Span, min: usize, max: usize) -> Result<Vec<Expr>, ()> {
        let list = self.parse_exprs()?;
        if list.len() < min || list.len() > max {
            let expected = if min == max { min.to_string() } else { format!("{} to {}", min, max) };
            let span = span.merge(self.peek().span);
            self.error_at(
                span,
                &format!("`{}` takes {} operands, found {}", head, expected, list.len()),
                ErrorCode::EXPECTED_EXPRESSION,
                "in this expression".to_string(),
            );
            return Err(());
        }
        Ok(list)
    }

    /// Parses one parenthesized expression
    pub fn parse_expr(&mut self) -> Result<Expr, ()> {
        if !self.check(&TokenKind::LParen) {
            self.error_at_current("expected an expression", ErrorCode::EXPECTED_EXPRESSION);
            return Err(());
        }
        self.advance();
        let head_token = self.advance().clone();
        let Some(head) = head_token.kind.as_atom() else {
            self.error_at(head_token.span, "expected an operator", ErrorCode::EXPECTED_EXPRESSION, format!("found: {}", head_token.kind));
            return Err(());
        };
        let span = head_token.span;

        let expr = match head {
            "block" => {
                let name = self.optional_name();
                let ty = self.parse_result()?.unwrap_or(ValueType::None);
                let list = self.parse_exprs()?;
                Builder::block_typed(name, list, ty)
            }
            "loop" => {
                let name = self.optional_name();
                let ty = self.parse_result()?.unwrap_or(ValueType::None);
                let mut list = self.parse_operands(head, span, 0, 1)?;
                let body = list.pop().unwrap_or_else(Builder::nop);
                Builder::loop_typed(name, body, ty)
            }
            "if" => {
                let ty = self.parse_result()?.unwrap_or(ValueType::None);
                let mut list = self.parse_operands(head, span, 2, 3)?.into_iter();
                match (list.next(), list.next(), list.next()) {
                    (Some(condition), Some(if_true), if_false) => Builder::if_typed(condition, if_true, if_false, ty),
                    _ => return Err(()),
                }
            }
            "br" => {
                let name = self.expect_name()?;
                let mut list = self.parse_operands(head, span, 0, 1)?;
                Builder::br(name, list.pop())
            }
            "br_if" => {
                let name = self.expect_name()?;
                let mut list = self.parse_operands(head, span, 1, 2)?;
                let condition = list.pop().ok_or(())?;
                Builder::br_if(name, list.pop(), condition)
            }
            "call" | "call_import" => {
                let target = self.expect_name()?;
                let operands = self.parse_exprs()?;
                let table = if head == "call" { &self.functions } else { &self.imports };
                match table.get(&target).map(|sig| sig.result) {
                    Some(result) if head == "call" => Builder::call(target, operands, result),
                    Some(result) => Builder::call_import(target, operands, result),
                    None => {
                        self.error_at(span, &format!("`{}` to unknown function `{}`", head, target), ErrorCode::UNKNOWN_FUNCTION, "called here".to_string());
                        return Err(());
                    }
                }
            }
            "call_indirect" => {
                let params = self.parse_type_clause("param")?;
                let result = self.parse_result()?.unwrap_or(ValueType::None);
                let mut operands = self.parse_operands(head, span, 1, usize::MAX)?;
                let target = operands.pop().ok_or(())?;
                Builder::call_indirect(params, result, target, operands)
            }
            "select" => {
                let ty = self.parse_result()?;
                let mut list = self.parse_operands(head, span, 3, 3)?.into_iter();
                match (list.next(), list.next(), list.next(), ty) {
                    (Some(a), Some(b), Some(c), Some(ty)) => {
                        let mut select = Builder::select(a, b, c);
                        select.ty = ty;
                        select
                    }
                    (Some(a), Some(b), Some(c), None) => Builder::select(a, b, c),
                    _ => return Err(()),
                }
            }
            "drop" => {
                let mut list = self.parse_operands(head, span, 1, 1)?;
                Builder::drop(list.pop().ok_or(())?)
            }
            "return" => {
                let mut list = self.parse_operands(head, span, 0, 1)?;
                Builder::ret(list.pop())
            }
            "nop" => Builder::nop(),
            "unreachable" => Builder::unreachable(),
            "local.get" => {
                let index = self.parse_index()?;
                match self.locals.get(index as usize) {
                    Some(ty) => Builder::local_get(index, *ty),
                    None => {
                        self.error_at(span, &format!("unknown local {}", index), ErrorCode::UNKNOWN_LOCAL, "read here".to_string());
                        return Err(());
                    }
                }
            }
            "local.set" => {
                let index = self.parse_index()?;
                let mut list = self.parse_operands(head, span, 1, 1)?;
                Builder::local_set(index, list.pop().ok_or(())?)
            }
            _ => self.parse_typed_operator(head, span)?,
        };

        self.expect(&TokenKind::RParen, "expected `)` to close the expression")?;
        Ok(expr)
    }

    /// Parses `T.const` and `T.add`-style operators
    fn parse_typed_operator(&mut self, head: &str, span: Span) -> Result<Expr, ()> {
        let parsed = head
            .split_once('.')
            .and_then(|(ty, op)| Some((ValueType::from_name(ty).filter(|t| t.is_concrete())?, op)));
        let Some((ty, op)) = parsed else {
            self.error_at(span, &format!("unknown operator `{}`", head), ErrorCode::UNKNOWN_OPERATOR, "not an operator".to_string());
            return Err(());
        };

        if op == "const" {
            return self.parse_literal(ty).map(Builder::constant);
        }
        let Some(op) = BinaryOp::from_name(op) else {
            self.error_at(span, &format!("unknown operator `{}`", head), ErrorCode::UNKNOWN_OPERATOR, "not an operator".to_string());
            return Err(());
        };
        let mut list = self.parse_operands(head, span, 2, 2)?.into_iter();
        match (list.next(), list.next()) {
            (Some(left), Some(right)) => {
                let mut binary = Builder::binary(op, left, right);
                binary.ty = ty;
                Ok(binary)
            }
            _ => Err(()),
        }
    }

    fn parse_index(&mut self) -> Result<u32, ()> {
        let index = match &self.peek().kind {
            TokenKind::Number(text) => text.parse::<u32>().ok(),
            _ => None,
        };
        match index {
            Some(index) => {
                self.advance();
                Ok(index)
            }
            None => {
                self.error_at_current("expected a local index", ErrorCode::INVALID_NUMBER);
                Err(())
            }
        }
    }

    fn parse_literal(&mut self, ty: ValueType) -> Result<Literal, ()> {
        let text = match &self.peek().kind {
            TokenKind::Number(text) | TokenKind::Atom(text) => text.to_ascii_lowercase(),
            _ => String::new(),
        };
        let literal = match ty {
            ValueType::I32 => text.parse::<i32>().ok().map(Literal::I32),
            ValueType::I64 => text.parse::<i64>().ok().map(Literal::I64),
            ValueType::F32 => text.parse::<f32>().ok().map(Literal::f32),
            ValueType::F64 => text.parse::<f64>().ok().map(Literal::f64),
            ValueType::None | ValueType::Unreachable => None,
        };
        match literal {
            Some(literal) => {
                self.advance();
                Ok(literal)
            }
            None => {
                self.error_at_current(&format!("expected a {} constant", ty), ErrorCode::INVALID_NUMBER);
                Err(())
            }
        }
    }
}

/// Parses tokens into a module
pub fn parse(tokens: Vec<Token>) -> (Module, Diagnostics) {
    let mut parser = Parser::new(tokens);
    let module = parser.parse_module();
    (module, parser.take_diagnostics())
}

/// Lexes and parses source text; lexer diagnostics come first
pub fn parse_source(source: &str, file_id: u32) -> (Module, Diagnostics) {
    let (tokens, mut diagnostics) = ruido_lexer::tokenize(source, file_id);
    let (module, parse_diagnostics) = parse(tokens);
    diagnostics.extend(parse_diagnostics);
    (module, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruido_ir::ExprKind;

    fn parse_ok(source: &str) -> Module {
        let (module, diags) = parse_source(source, 0);
        assert!(diags.is_empty(), "unexpected diagnostics: {}", diags);
        module
    }

    #[test]
    fn test_empty_module() {
        let module = parse_ok("(module $empty)");
        assert_eq!(module.name, Some(Name::from("empty")));
        assert!(module.functions.is_empty());
        assert!(module.table.is_none());
    }

    #[test]
    fn test_function_header() {
        let module = parse_ok("(module (func $f (param i32 i64) (local f32) (result i32) (local.get 0)))");
        let func = &module.functions[0];
        assert_eq!(func.params, vec![ValueType::I32, ValueType::I64]);
        assert_eq!(func.vars, vec![ValueType::F32]);
        assert_eq!(func.result, ValueType::I32);
        assert_eq!(func.body, Builder::local_get(0, ValueType::I32));
    }

    #[test]
    fn test_call_before_declaration() {
        let module = parse_ok(
            "(module
               (func $a (result i64) (call $b (i32.const 1)))
               (func $b (param i32) (result i64) (i64.const 2)))",
        );
        let body = &module.functions[0].body;
        assert_eq!(body.ty, ValueType::I64);
        assert!(matches!(&body.kind, ExprKind::Call { target, .. } if target == "b"));
    }

    #[test]
    fn test_imports_and_table() {
        let module = parse_ok(
            r#"(module
                 (import $log "env" "log" (param f64))
                 (table $main $main)
                 (func $main (call_import $log (f64.const 1.5))))"#,
        );
        assert_eq!(module.imports[0].module, "env");
        assert_eq!(module.imports[0].params, vec![ValueType::F64]);
        assert_eq!(module.table.as_ref().map(Table::len), Some(2));
        assert_eq!(module.functions[0].body.ty, ValueType::None);
    }

    #[test]
    fn test_branches() {
        let module = parse_ok(
            "(module
               (func $f (result i32)
                 (block $out (result i32)
                   (drop (br_if $out (i32.const 1) (i32.const 0)))
                   (br $out (i32.const 2)))))",
        );
        let body = &module.functions[0].body;
        assert_eq!(body.ty, ValueType::I32);
        assert_eq!(body.label(), Some(&Name::from("out")));
        let ExprKind::Block { list, .. } = &body.kind else {
            panic!("expected a block");
        };
        assert_eq!(list[1].ty, ValueType::Unreachable);
    }

    #[test]
    fn test_float_specials() {
        let module = parse_ok("(module (func $f (result f32) (f32.const -inf)))");
        assert_eq!(module.functions[0].body, Builder::constant(Literal::f32(f32::NEG_INFINITY)));
    }

    #[test]
    fn test_unknown_operator() {
        let (_, diags) = parse_source("(module (func $f (i32.frobnicate)))", 0);
        assert!(diags.has_code(ErrorCode::UNKNOWN_OPERATOR));
    }

    #[test]
    fn test_unknown_callee() {
        let (module, diags) = parse_source("(module (func $f (call $nobody)) (func $g (nop)))", 0);
        assert!(diags.has_code(ErrorCode::UNKNOWN_FUNCTION));
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, Name::from("g"));
    }

    #[test]
    fn test_wrong_operand_count() {
        let (_, diags) = parse_source("(module (func $f (drop)))", 0);
        assert!(diags.has_code(ErrorCode::EXPECTED_EXPRESSION));
    }

    #[test]
    fn test_duplicate_function() {
        let (_, diags) = parse_source("(module (func $f (nop)) (func $f (nop)))", 0);
        assert!(diags.has_code(ErrorCode::DUPLICATE_DEFINITION));
    }

    #[test]
    fn test_constant_out_of_range() {
        let (_, diags) = parse_source("(module (func $f (result i32) (i32.const 4294967296)))", 0);
        assert!(diags.has_code(ErrorCode::INVALID_NUMBER));
    }
}
