//! ruido-ir - Typed expression-tree IR
//!
//! Function bodies are trees of expressions, each carrying a static result
//! type drawn from a small closed set. Blocks and loops may carry a label
//! that nested branches target.
//!
//! # Architecture
//!
//! ```text
//! IR text (ruido-parser)
//!         ↓
//!   Module
//!   ├── Imports
//!   ├── Table (ordinal -> function)
//!   └── Functions
//!       └── Body: Expr tree
//!         ↓
//!   [walk_expr]  ← ruido-fuzz mutates bodies in place
//!         ↓
//!   [validate] / [Display]
//! ```

pub mod types;
pub mod expr;
pub mod module;
pub mod builder;
pub mod walk;
pub mod validate;
pub mod print;

pub use types::{BinaryOp, Literal, Name, ValueType};
pub use expr::{Expr, ExprKind};
pub use module::{Function, Import, Module, Signature, Table};
pub use builder::Builder;
pub use walk::{for_each_expr, walk_expr, Visitor};
pub use validate::{validate_function, validate_module};
