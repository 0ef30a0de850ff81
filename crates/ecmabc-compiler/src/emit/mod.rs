//! Emission: codegen output to program.
//!
//! - [`FunctionEmitter`] builds one [`FunctionArtifact`] per function
//! - [`ModuleRecordEmitter`] serializes the module linkage record
//! - [`Emitter`] aggregates both into a [`Program`](crate::assembly::Program)

mod emitter;
mod function_emitter;
mod module_record_emitter;

pub use emitter::{COMMONJS_FIELD, COMMONJS_RECORD, Emitter, MODULE_RECORD_FIELD};
pub use function_emitter::{FunctionArtifact, FunctionEmitter};
pub use module_record_emitter::{ModuleRecordEmitter, SerializedModuleRecord};
