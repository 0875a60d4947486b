//! ruido-lexer - Lexer for the ruido IR text format
//!
//! Converts IR text into a sequence of tokens.
//!
//! # Example
//!
//! ```rust
//! use ruido_lexer::{Lexer, TokenKind};
//!
//! let source = "(module (func $main (nop)))";
//!
//! let mut lexer = Lexer::new(source, 0);
//! let tokens = lexer.tokenize();
//!
//! assert_eq!(tokens[0].kind, TokenKind::LParen);
//! ```

pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenKind};
