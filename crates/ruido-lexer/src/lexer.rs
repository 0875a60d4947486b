//! Lexer for the ruido IR text format
//!
//! Converts IR text into a sequence of tokens. Comments run from `;;` to
//! the end of the line.

use crate::token::{Token, TokenKind};
use ruido_error::{
    span::{Position, Span},
    Diagnostic, Diagnostics, ErrorCode,
};
use unicode_xid::UnicodeXID;

/// Characters allowed inside atoms and names besides identifier characters
fn is_word_char(ch: char) -> bool {
    ch.is_xid_continue() || matches!(ch, '.' | '$' | '-' | '+' | '/' | '\'' | '@')
}

/// The ruido IR Lexer
pub struct Lexer {
    /// Source characters
    chars: Vec<char>,
    /// Current position (index in chars vector)
    pos: usize,
    /// Current line (1-indexed)
    line: u32,
    /// Current column (1-indexed)
    column: u32,
    /// Byte offset
    offset: usize,
    file_id: u32,
    diagnostics: Diagnostics,
}

impl Lexer {
    /// Creates a new lexer for the given source
    pub fn new(source: &str, file_id: u32) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            offset: 0,
            file_id,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Returns the accumulated diagnostics
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Consumes and returns the diagnostics
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        self.offset += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn make_span(&self, start: Position) -> Span {
        Span::new(start, self.current_position(), self.file_id)
    }

    /// Skips whitespace and `;;` comments
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some(';') if self.peek_next() == Some(';') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Reads a run of word characters
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if is_word_char(ch) {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    /// Reads a number; validity for a given width is checked by the parser
    fn read_number(&mut self) -> Token {
        let start = self.current_position();
        let text: String = self.read_word().chars().filter(|&c| c != '_').collect();
        let span = self.make_span(start);

        let digits = text.trim_start_matches(['-', '+']);
        let well_formed = digits.starts_with(|c: char| c.is_ascii_digit())
            || matches!(digits, "inf" | "nan" | "NaN" | "infinity");
        if !well_formed {
            self.diagnostics.push(
                Diagnostic::error(format!("invalid number `{}`", text))
                    .with_code(ErrorCode::INVALID_NUMBER)
                    .with_label(span, "not a number"),
            );
            return Token::new(TokenKind::Error(format!("invalid number: {}", text)), span);
        }

        Token::new(TokenKind::Number(text), span)
    }

    /// Reads a string
    fn read_string(&mut self) -> Token {
        let start = self.current_position();
        self.advance(); // Consume the opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.make_span(start);
                    self.diagnostics.push(
                        Diagnostic::error("unterminated string")
                            .with_code(ErrorCode::UNTERMINATED_STRING)
                            .with_label(span, "string starts here but was not closed")
                            .with_help("add \" at the end of the string"),
                    );
                    return Token::new(TokenKind::Str(value), span);
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('0') => value.push('\0'),
                        // \\, \" and \' stand for themselves, like any other escaped char
                        Some(ch) => value.push(ch),
                        None => break,
                    }
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Token::new(TokenKind::Str(value), self.make_span(start))
    }

    /// Returns the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.current_position();

        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, self.make_span(start));
        };

        match ch {
            '(' => {
                self.advance();
                Token::new(TokenKind::LParen, self.make_span(start))
            }
            ')' => {
                self.advance();
                Token::new(TokenKind::RParen, self.make_span(start))
            }
            '"' => self.read_string(),
            '$' => {
                self.advance();
                let name = self.read_word();
                let span = self.make_span(start);
                if name.is_empty() {
                    self.diagnostics.push(
                        Diagnostic::error("empty name")
                            .with_code(ErrorCode::UNEXPECTED_CHAR)
                            .with_label(span, "expected a name after `$`"),
                    );
                    return Token::new(TokenKind::Error("empty name".to_string()), span);
                }
                Token::new(TokenKind::Name(name), span)
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => self.read_number(),
            c if c.is_xid_start() || c == '_' => {
                let word = self.read_word();
                Token::new(TokenKind::Atom(word), self.make_span(start))
            }
            _ => {
                self.advance();
                let span = self.make_span(start);
                self.diagnostics.push(
                    Diagnostic::error(format!("unexpected character: '{}'", ch))
                        .with_code(ErrorCode::UNEXPECTED_CHAR)
                        .with_label(span, "unrecognized character"),
                );
                Token::new(TokenKind::Error(format!("unexpected character: {}", ch)), span)
            }
        }
    }

    /// Tokenizes the entire source
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        tokens
    }
}

/// Tokenizes source text and returns the tokens
pub fn tokenize(source: &str, file_id: u32) -> (Vec<Token>, Diagnostics) {
    let mut lexer = Lexer::new(source, file_id);
    let tokens = lexer.tokenize();
    (tokens, lexer.take_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source, 0);
        lexer
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, TokenKind::Eof))
            .collect()
    }

    fn atom(word: &str) -> TokenKind {
        TokenKind::Atom(word.into())
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = lex("(block $out (result i32) (nop))");
        assert_eq!(
            tokens,
            vec![
                TokenKind::LParen,
                atom("block"),
                TokenKind::Name("out".into()),
                TokenKind::LParen,
                atom("result"),
                atom("i32"),
                TokenKind::RParen,
                TokenKind::LParen,
                atom("nop"),
                TokenKind::RParen,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_dotted_atoms_and_names() {
        let tokens = lex("i32.const local.get $fuzz$12");
        assert_eq!(
            tokens,
            vec![atom("i32.const"), atom("local.get"), TokenKind::Name("fuzz$12".into())]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 -7 3.5 1_000 -inf");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Number("42".into()),
                TokenKind::Number("-7".into()),
                TokenKind::Number("3.5".into()),
                TokenKind::Number("1000".into()),
                TokenKind::Number("-inf".into()),
            ]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = lex(r#""env" "a\"b\n""#);
        assert_eq!(tokens, vec![TokenKind::Str("env".into()), TokenKind::Str("a\"b\n".into())]);
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = lex(";; header\n(nop) ;; trailing\n");
        assert_eq!(tokens, vec![TokenKind::LParen, atom("nop"), TokenKind::RParen]);
    }

    #[test]
    fn test_unterminated_string() {
        let (_, diags) = tokenize("(import $x \"env", 0);
        assert!(diags.has_code(ErrorCode::UNTERMINATED_STRING));
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, diags) = tokenize("(nop) #", 0);
        assert!(diags.has_code(ErrorCode::UNEXPECTED_CHAR));
        assert!(tokens.iter().any(Token::is_error));
    }

    #[test]
    fn test_spans_track_lines() {
        let mut lexer = Lexer::new("(module\n  $m)", 0);
        let tokens = lexer.tokenize();
        let name = &tokens[2];
        assert_eq!(name.kind, TokenKind::Name("m".into()));
        assert_eq!(name.span.start.line, 2);
        assert_eq!(name.span.start.column, 3);
    }
}
