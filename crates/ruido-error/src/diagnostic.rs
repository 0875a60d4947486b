//! Diagnostic - Rust-style error messages for IR text and validation
//!
//! A diagnostic carries an error code (EL001, EP002, EV003, ...), an
//! optional location in the source text, and free-form notes. Problems
//! found by the validator have no location and name the function instead.

use std::fmt::{self, Write};

use thiserror::Error;

use crate::span::Span;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The module cannot be used
    Error,
    /// The module is still usable
    Warning,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
        }
    }

    /// ANSI color of the level's header
    fn color_code(&self) -> &'static str {
        match self {
            Level::Error => "\x1b[1;31m",
            Level::Warning => "\x1b[1;33m",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message attached to a region of the source
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// Structured error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category (L = Lexer, P = Parser, V = Validation)
    pub category: char,
    pub number: u16,
}

impl ErrorCode {
    pub const fn new(category: char, number: u16) -> Self {
        Self { category, number }
    }

    // Lexer
    pub const UNEXPECTED_CHAR: Self = Self::new('L', 1);
    pub const UNTERMINATED_STRING: Self = Self::new('L', 2);
    pub const INVALID_NUMBER: Self = Self::new('L', 3);

    // Parser
    pub const UNEXPECTED_TOKEN: Self = Self::new('P', 1);
    pub const EXPECTED_EXPRESSION: Self = Self::new('P', 2);
    pub const EXPECTED_TYPE: Self = Self::new('P', 3);
    pub const UNKNOWN_OPERATOR: Self = Self::new('P', 4);
    pub const DUPLICATE_DEFINITION: Self = Self::new('P', 5);

    // Validation
    pub const TYPE_MISMATCH: Self = Self::new('V', 1);
    pub const UNKNOWN_LABEL: Self = Self::new('V', 2);
    pub const DUPLICATE_LABEL: Self = Self::new('V', 3);
    pub const UNKNOWN_FUNCTION: Self = Self::new('V', 4);
    pub const ARITY_MISMATCH: Self = Self::new('V', 5);
    pub const MISSING_TABLE: Self = Self::new('V', 6);
    pub const UNKNOWN_LOCAL: Self = Self::new('V', 7);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}{:03}", self.category, self.number)
    }
}

/// A complete diagnostic
#[derive(Debug, Clone, Error)]
#[error("{level}: {message}")]
pub struct Diagnostic {
    pub level: Level,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Points the diagnostic at a region of the source
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: message.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

/// Source files diagnostics may point into
#[derive(Debug, Default)]
pub struct SourceCache {
    files: Vec<SourceFile>,
}

#[derive(Debug)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Byte offset where each line starts
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { name: name.into(), source, line_starts }
    }

    /// Returns a line without its newline (lines are 1-indexed)
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let index = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(index)?;
        let end = self.line_starts.get(index + 1).map_or(self.source.len(), |&next| next - 1);
        self.source.get(start..end)
    }
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns its ID
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> u32 {
        self.files.push(SourceFile::new(name, source));
        (self.files.len() - 1) as u32
    }

    pub fn get(&self, id: u32) -> Option<&SourceFile> {
        self.files.get(id as usize)
    }
}

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const BLUE: &str = "\x1b[1;34m";
const GREEN: &str = "\x1b[1;32m";

/// Renders diagnostics with source snippets
pub struct DiagnosticRenderer<'a> {
    cache: &'a SourceCache,
    use_colors: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(cache: &'a SourceCache) -> Self {
        Self { cache, use_colors: true }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    fn paint(&self, code: &'static str) -> &'static str {
        if self.use_colors {
            code
        } else {
            ""
        }
    }

    /// Renders the diagnostic as a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write(&mut out, diagnostic);
        out
    }

    fn write(&self, out: &mut String, diagnostic: &Diagnostic) -> fmt::Result {
        let reset = self.paint(RESET);
        let color = self.paint(diagnostic.level.color_code());
        let blue = self.paint(BLUE);

        // error[EV001]: message
        write!(out, "{}{}", color, diagnostic.level)?;
        if let Some(code) = diagnostic.code {
            write!(out, "[{}]", code)?;
        }
        writeln!(out, "{}{}: {}{}", reset, self.paint(BOLD), diagnostic.message, reset)?;

        for label in &diagnostic.labels {
            let start = label.span.start;
            let Some(file) = self.cache.get(label.span.file_id) else {
                continue;
            };
            writeln!(out, " {}-->{} {}:{}:{}", blue, reset, file.name, start.line, start.column)?;
            let Some(line) = file.get_line(start.line) else {
                continue;
            };

            let gutter = " ".repeat(start.line.to_string().len());
            let width = if label.span.end.line == start.line {
                label.span.end.column.saturating_sub(start.column).max(1) as usize
            } else {
                line.len().saturating_sub(start.column as usize - 1).max(1)
            };
            writeln!(out, " {} {}|{}", gutter, blue, reset)?;
            writeln!(out, " {}{} |{} {}", blue, start.line, reset, line)?;
            writeln!(
                out,
                " {} {}|{} {}{}{} {}{}",
                gutter,
                blue,
                reset,
                " ".repeat(start.column.saturating_sub(1) as usize),
                color,
                "^".repeat(width),
                label.message,
                reset
            )?;
        }

        for note in &diagnostic.notes {
            writeln!(out, "   = {}note{}: {}", self.paint(BOLD), reset, note)?;
        }
        for help in &diagnostic.help {
            writeln!(out, "   = {}help{}: {}", self.paint(GREEN), reset, help)?;
        }
        Ok(())
    }
}
