//! Tokens for the ruido IR text format
//!
//! The format is an s-expression syntax: parentheses, bare atoms
//! (`module`, `block`, `i32.const`, `nan`), `$names`, numbers and strings.

use ruido_error::span::Span;
use std::fmt;

/// All token types the lexer can produce
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// Bare word: keywords, type names, operators (`i32.add`)
    Atom(String),
    /// `$name`, stored without the `$`
    Name(String),
    /// Numeric literal, kept as written (sign included) so the parser can
    /// read it at the width the context requires
    Number(String),
    /// `"..."` with escapes resolved
    Str(String),
    Eof,
    Error(String),
}

impl TokenKind {
    /// Returns the atom text, if this is an atom
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            TokenKind::Atom(word) => Some(word),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Atom(word) => write!(f, "`{}`", word),
            TokenKind::Name(name) => write!(f, "`${}`", name),
            TokenKind::Number(text) => write!(f, "number `{}`", text),
            TokenKind::Str(text) => write!(f, "string {:?}", text),
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Error(msg) => write!(f, "ERROR({})", msg),
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Checks if the token is of a specific type
    pub fn is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(kind)
    }

    /// Checks if the token is the given atom
    pub fn is_atom(&self, word: &str) -> bool {
        self.kind.as_atom() == Some(word)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.kind, self.span.start.line, self.span.start.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_display() {
        assert_eq!(TokenKind::Atom("block".into()).to_string(), "`block`");
        assert_eq!(TokenKind::Name("out".into()).to_string(), "`$out`");
        assert_eq!(TokenKind::Number("-3".into()).to_string(), "number `-3`");
    }

    #[test]
    fn test_is_atom() {
        let token = Token::new(TokenKind::Atom("func".into()), Span::default());
        assert!(token.is_atom("func"));
        assert!(!token.is_atom("module"));
        assert!(token.is(&TokenKind::Atom(String::new())));
    }
}
