//! Assembly model of the emitted program.
//!
//! - [`Opcode`] - The instruction set used by emitted functions
//! - [`Function`] and [`Ins`] - Label-free instruction lists with debug info
//! - [`Literal`] and [`LiteralArray`] - Side tables of tagged values
//! - [`Program`] and [`Record`] - The aggregated output
//! - [`write_asm`] - Textual disassembly

mod dump;
mod function;
mod literal;
mod opcode;
mod program;

pub use dump::{AsmDisplay, write_asm};
pub use function::{
    CatchBlock, Function, FunctionKind, Ins, InsDebug, LocalVariable, Operand, SourceDebugInfo,
};
pub use literal::{Literal, LiteralArray, LiteralTag, literal_array_key};
pub use opcode::{Opcode, OperandKind};
pub use program::{Field, FieldValue, Program, Record};
