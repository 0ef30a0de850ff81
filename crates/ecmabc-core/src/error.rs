//! Unified error types for the ecmabc backend.
//!
//! ## Error Hierarchy
//!
//! ```text
//! EcmabcError (top-level wrapper)
//! ├── ModuleError - Module linkage errors (user-triggerable)
//! └── EmitError   - Malformed codegen output found while emitting a function
//! ```
//!
//! Contract violations (a malformed import entry, a submission to a finalized
//! program) are not represented here. They indicate a bug earlier in the
//! pipeline and panic at the point of detection.

use thiserror::Error;

// ============================================================================
// Module Linkage Errors
// ============================================================================

/// Errors raised while building a module linkage record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The export name is already bound by a local or indirect export.
    #[error("duplicate export binding for name '{name}'")]
    DuplicateExport {
        /// The export name that was already taken.
        name: String,
    },
}

impl ModuleError {
    /// Create a duplicate export error.
    pub fn duplicate_export(name: impl Into<String>) -> Self {
        ModuleError::DuplicateExport { name: name.into() }
    }
}

// ============================================================================
// Emission Errors
// ============================================================================

/// Errors found while turning a function's codegen output into an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// An instruction, catch table or scope refers to a label that is never placed.
    #[error("function '{function}': label L{label} is never placed")]
    UnboundLabel {
        /// The function being emitted.
        function: String,
        /// The dangling label id.
        label: u32,
    },

    /// Two literal buffers of one function share an id.
    #[error("function '{function}': literal buffer {id} defined more than once")]
    DuplicateLiteralBuffer {
        /// The function being emitted.
        function: String,
        /// The repeated buffer id.
        id: u32,
    },

    /// An instruction refers to a literal buffer the function does not define.
    #[error("function '{function}': literal buffer {id} is not defined")]
    UnknownLiteralBuffer {
        /// The function being emitted.
        function: String,
        /// The missing buffer id.
        id: u32,
    },

    /// An instruction carries the wrong number of operands for its opcode.
    #[error("function '{function}': {opcode} expects {expected} operands, found {found}")]
    OperandCountMismatch {
        /// The function being emitted.
        function: String,
        /// Mnemonic of the offending instruction.
        opcode: &'static str,
        /// Operand count the opcode takes.
        expected: usize,
        /// Operand count that was supplied.
        found: usize,
    },

    /// An operand does not fit the slot the opcode declares for it.
    #[error("function '{function}': {opcode} operand {index} expects a {expected}, found a {found}")]
    OperandKindMismatch {
        /// The function being emitted.
        function: String,
        /// Mnemonic of the offending instruction.
        opcode: &'static str,
        /// Position of the operand.
        index: usize,
        /// Slot kind the opcode declares.
        expected: &'static str,
        /// Kind of the supplied operand.
        found: &'static str,
    },
}

impl EmitError {
    /// Name of the function the error was raised for.
    pub fn function(&self) -> &str {
        match self {
            EmitError::UnboundLabel { function, .. } => function,
            EmitError::DuplicateLiteralBuffer { function, .. } => function,
            EmitError::UnknownLiteralBuffer { function, .. } => function,
            EmitError::OperandCountMismatch { function, .. } => function,
            EmitError::OperandKindMismatch { function, .. } => function,
        }
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for all ecmabc operations.
///
/// Each variant uses `#[from]` so phase errors convert with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcmabcError {
    /// A module linkage error.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// A function emission error.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl EcmabcError {
    /// Check if this is a module linkage error.
    pub fn is_module(&self) -> bool {
        matches!(self, EcmabcError::Module(_))
    }

    /// Check if this is an emission error.
    pub fn is_emit(&self) -> bool {
        matches!(self, EcmabcError::Emit(_))
    }
}
