//! ruido-parser - Parser for the ruido IR text format
//!
//! Converts a sequence of tokens into a `ruido_ir::Module`.
//!
//! # Example
//!
//! ```rust
//! use ruido_lexer::Lexer;
//! use ruido_parser::parse;
//!
//! let source = "(module (func $main (result i32) (i32.const 1)))";
//! let mut lexer = Lexer::new(source, 0);
//! let tokens = lexer.tokenize();
//!
//! let (module, diagnostics) = parse(tokens);
//! assert!(diagnostics.is_empty());
//! assert_eq!(module.functions.len(), 1);
//! ```

pub mod parser;

pub use parser::{parse, parse_source, Parser};
