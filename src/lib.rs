//! Paradigm Shift
//!
//! Converts functions between asynchronous calling conventions:
//! - classical `(...args, on_ok, on_err)`
//! - baroque `(...args, on_err, on_ok)`
//! - modern `(...args, |err, result| ..)`
//! - promise (returns an eventual value)
//! - deferred (returns the eventual value of a resolve/reject controller)

pub mod callable;
pub mod config;
pub mod convert;
pub mod engines;
pub mod error;
pub mod eventual;
pub mod matrix;
pub mod paradigm;
pub mod signature;

// Re-exports for convenience
pub use callable::{is_truthy, Arg, Callable, Handler, Outcome, Scope};
pub use config::{ConfigManager, PromiseEngine, ShiftConfig};
pub use convert::{convert, Conversion, Converted, FromParadigm, Member};
pub use engines::Engines;
pub use error::{ConversionError, Result};
pub use eventual::{Deferred, DeferredProvider, Promise, PromiseProvider, Settlement, Settler};
pub use paradigm::{Paradigm, PARADIGMS, PARADIGM_NAMES};
