//! ruido-error - Diagnostics system for the ruido IR toolchain
//!
//! This crate provides structures for reporting problems found while
//! reading and checking textual IR modules, rendered in the style of the
//! Rust compiler.
//!
//! # Example
//!
//! ```rust
//! use ruido_error::{Diagnostic, ErrorCode, SourceCache, DiagnosticRenderer};
//! use ruido_error::span::{Span, Position};
//!
//! let mut cache = SourceCache::new();
//! let file_id = cache.add("example.wast", "(module (func $f (nop)))");
//!
//! let span = Span::new(
//!     Position::new(1, 15, 14),
//!     Position::new(1, 17, 16),
//!     file_id,
//! );
//!
//! let diagnostic = Diagnostic::error("unknown label")
//!     .with_code(ErrorCode::UNKNOWN_LABEL)
//!     .with_label(span, "no enclosing block or loop has this name");
//!
//! let renderer = DiagnosticRenderer::new(&cache);
//! println!("{}", renderer.render(&diagnostic));
//! ```

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticRenderer, ErrorCode, Label, Level, SourceCache, SourceFile};
pub use span::{Position, Span};

/// Default Result type for operations that may fail with a diagnostic
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Collection of diagnostics accumulated while processing a module
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.items.push(Diagnostic::error(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.items.push(Diagnostic::warning(message));
    }

    /// Appends every diagnostic from `other`
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.level == Level::Error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.level == Level::Error).count()
    }

    /// Checks whether any diagnostic carries the given code
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.items.iter().any(|d| d.code == Some(code))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Renders all diagnostics
    pub fn render(&self, cache: &SourceCache) -> String {
        let renderer = DiagnosticRenderer::new(cache);
        self.items
            .iter()
            .map(|d| renderer.render(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, diagnostic) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self { items: vec![diagnostic] }
    }
}
