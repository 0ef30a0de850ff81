//! Module linkage and program emission for an ECMAScript compiler backend.
//!
//! The binding pass fills a [`SourceTextModuleRecord`](module::SourceTextModuleRecord),
//! instruction selection produces one [`FunctionGen`](compiler::FunctionGen)
//! per function, and [`emit_program`] turns both into a
//! [`Program`](compiler::Program), emitting functions in parallel.

pub use ecmabc_compiler as compiler;
pub use ecmabc_core as core;
pub use ecmabc_module as module;

mod pipeline;

pub use pipeline::emit_program;

pub mod prelude {
    pub use bumpalo::Bump;

    pub use crate::core::{
        CompileContext, CompileOptions, EcmabcError, EmitError, ModuleError, SourceRange,
    };
    pub use crate::module::{
        ExportEntry, ImportEntry, IndirectExport, LocalExport, ModuleRequestIdx, StarExport,
        SourceTextModuleRecord,
    };
    pub use crate::compiler::assembly::{FunctionKind, Literal, Opcode, Program};
    pub use crate::compiler::emit::{Emitter, FunctionEmitter, ModuleRecordEmitter};
    pub use crate::compiler::ir::{FunctionGen, IrOperand, ScopeNode, ScopeVariable, SourceFile};
    pub use crate::emit_program;
}
