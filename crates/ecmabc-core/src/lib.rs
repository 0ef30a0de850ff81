//! Shared building blocks for the ecmabc backend.
//!
//! - [`error`]: error types for module linkage and emission
//! - [`options`]: compile session configuration
//! - [`span`]: source ranges, locations and the line index

pub mod error;
pub mod options;
pub mod span;

pub use error::{EcmabcError, EmitError, ModuleError};
pub use options::{CompileContext, CompileOptions, DEFAULT_RECORD_NAME};
pub use span::{LineIndex, SourceLocation, SourceRange};
