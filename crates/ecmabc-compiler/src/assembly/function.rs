//! Emitted functions.

use bitflags::bitflags;
use ordered_float::OrderedFloat;

use super::Opcode;

bitflags! {
    /// What kind of function a body belongs to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionKind: u8 {
        const ASYNC = 1 << 0;
        const GENERATOR = 1 << 1;
        const ARROW = 1 << 2;
        const METHOD = 1 << 3;
        /// The top-level body of a module or script.
        const MODULE_ENTRY = 1 << 4;
    }
}

/// A resolved instruction operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Reg(u16),
    Imm(i64),
    Double(OrderedFloat<f64>),
    Str(String),
    Func(String),
    /// Program-wide literal array key.
    LiteralArray(String),
    /// Branch target as an instruction index within the function.
    Offset(u32),
}

/// Source position of an instruction; present only in debug builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InsDebug {
    /// 1-indexed.
    pub line: u32,
    /// 1-indexed, byte-based.
    pub column: u32,
}

/// One emitted instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ins {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub debug: Option<InsDebug>,
}

/// Exception handler range; offsets are instruction indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatchBlock {
    pub try_begin: u32,
    /// Exclusive.
    pub try_end: u32,
    pub catch_begin: u32,
}

/// Debug descriptor of a register-allocated local variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalVariable {
    pub name: String,
    pub signature: String,
    pub reg: u16,
    /// First instruction of the enclosing scope.
    pub start: u32,
    /// Number of instructions the variable is live for.
    pub length: u32,
}

/// Source-level debug info of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceDebugInfo {
    pub file: String,
    /// xxh64 of the source text.
    pub checksum: u64,
    /// Full source text, only kept on module entry functions.
    pub source_code: Option<String>,
}

/// A finished function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    pub param_count: u32,
    pub ins: Vec<Ins>,
    pub catch_blocks: Vec<CatchBlock>,
    pub locals: Vec<LocalVariable>,
    pub debug: Option<SourceDebugInfo>,
}

impl Function {
    pub fn new(name: impl Into<String>, kind: FunctionKind, param_count: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            param_count,
            ins: Vec::new(),
            catch_blocks: Vec::new(),
            locals: Vec::new(),
            debug: None,
        }
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        self.ins.iter().map(|ins| ins.opcode).collect()
    }

    /// Panics with a readable diff if the opcode sequence differs.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[Opcode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Instruction mismatch in '{}'.\nExpected: {:?}\nActual:   {:?}",
            self.name,
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }
}
