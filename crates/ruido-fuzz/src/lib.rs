//! ruido-fuzz - Type-directed random mutation of IR modules
//!
//! Walks the functions of a [`ruido_ir::Module`] and replaces random nodes
//! with freshly synthesized subtrees of the same static type, keeping the
//! module well-typed. All randomness comes from one seeded source, so a
//! seed reproduces a run exactly.
//!
//! # Example
//!
//! ```rust
//! use ruido_fuzz::{fuzz_module, FuzzConfig};
//! use ruido_ir::{validate_module, Builder, Function, Module, ValueType};
//!
//! let mut module = Module::new();
//! module.add_function(Function::new("f", vec![], ValueType::None, Builder::nop()));
//!
//! let stats = fuzz_module(&mut module, &FuzzConfig::default().with_replace_chance(100));
//! assert_eq!(stats.replaced, 1);
//! assert!(validate_module(&module).is_empty());
//! ```

pub mod budget;
pub mod config;
pub mod names;
pub mod noise;
pub mod pass;
pub mod scope;
pub mod synth;

pub use config::FuzzConfig;
pub use pass::{fuzz_module, FuzzPass, FuzzStats};
pub use synth::{ModuleContext, SynthKind, Synthesizer};
