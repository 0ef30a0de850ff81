//! ECMAScript program emission.
//!
//! ## Architecture
//!
//! - **Per function** (any thread): [`FunctionEmitter`] turns the codegen
//!   output of one function into a self-contained [`FunctionArtifact`]
//! - **Per module**: [`ModuleRecordEmitter`] flattens the module linkage record
//!   into a literal array
//! - **Per program**: [`Emitter`] merges artifacts under a short lock and is
//!   consumed by [`Emitter::finalize`]
//!
//! ## Modules
//!
//! - [`assembly`]: Opcodes, functions, literals, records and the program
//! - [`emit`]: The emitters
//! - [`ir`]: Codegen output consumed by the function emitter

pub mod assembly;
pub mod emit;
pub mod ir;

pub use assembly::{Function, Literal, LiteralArray, Opcode, Program, Record, write_asm};
pub use emit::{
    Emitter, FunctionArtifact, FunctionEmitter, ModuleRecordEmitter, SerializedModuleRecord,
};
pub use ir::{FunctionGen, IrOperand, Label, SourceFile};

pub use ecmabc_core::EmitError;
