//! Codegen output consumed by the function emitter.
//!
//! Instruction selection produces one [`FunctionGen`] per function: a flat
//! list of instructions and labels, exception ranges, the scope tree with
//! register-allocated variables, and the literal buffers hoisted out of array
//! and object literals. Branch targets are still symbolic [`Label`]s here;
//! the emitter resolves them to instruction offsets.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ecmabc_compiler::assembly::Opcode;
//! use ecmabc_compiler::ir::{FunctionGen, IrOperand, SourceFile};
//!
//! let source = Arc::new(SourceFile::new("main.js", "while (x) {}"));
//! let mut codegen = FunctionGen::new("main", source);
//!
//! let head = codegen.new_label();
//! let exit = codegen.new_label();
//! codegen.place_label(head);
//! codegen.emit(Opcode::TryLdGlobalByName, vec![IrOperand::str("x")]);
//! codegen.emit(Opcode::Jeqz, vec![IrOperand::Label(exit)]);
//! codegen.emit(Opcode::Jmp, vec![IrOperand::Label(head)]);
//! codegen.place_label(exit);
//! codegen.emit(Opcode::ReturnUndefined, vec![]);
//!
//! assert_eq!(codegen.insn_count(), 4);
//! ```

mod source;

use std::fmt;
use std::sync::Arc;

use ecmabc_core::SourceRange;

use crate::assembly::{FunctionKind, Literal, Opcode, OperandKind};

pub use source::SourceFile;

/// A symbolic branch target, unique within its function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// An operand before label and literal buffer resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum IrOperand {
    Reg(u16),
    Imm(i64),
    Double(f64),
    Str(String),
    Func(String),
    /// Id of one of this function's literal buffers.
    LiteralBuffer(u32),
    Label(Label),
}

impl IrOperand {
    pub fn str(value: impl Into<String>) -> Self {
        IrOperand::Str(value.into())
    }

    pub fn func(name: impl Into<String>) -> Self {
        IrOperand::Func(name.into())
    }

    /// The operand slot kind this value fills.
    pub fn kind(&self) -> OperandKind {
        match self {
            IrOperand::Reg(_) => OperandKind::Reg,
            IrOperand::Imm(_) => OperandKind::Imm,
            IrOperand::Double(_) => OperandKind::Double,
            IrOperand::Str(_) => OperandKind::Str,
            IrOperand::Func(_) => OperandKind::Func,
            IrOperand::LiteralBuffer(_) => OperandKind::LiteralArray,
            IrOperand::Label(_) => OperandKind::Label,
        }
    }
}

/// One selected instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Insn {
    pub opcode: Opcode,
    pub operands: Vec<IrOperand>,
    /// Source range of the AST node the instruction was selected for.
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrNode {
    Label(Label),
    Insn(Insn),
}

/// A protected range and its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchTable {
    pub try_begin: Label,
    pub try_end: Label,
    pub catch_begin: Label,
}

/// A variable living in a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeVariable {
    pub name: String,
    pub reg: u16,
}

impl ScopeVariable {
    pub fn new(name: impl Into<String>, reg: u16) -> Self {
        Self {
            name: name.into(),
            reg,
        }
    }
}

/// A lexical scope spanning the instructions between two labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeNode {
    pub start: Label,
    pub end: Label,
    pub variables: Vec<ScopeVariable>,
    pub children: Vec<ScopeNode>,
}

impl ScopeNode {
    pub fn new(start: Label, end: Label) -> Self {
        Self {
            start,
            end,
            variables: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: ScopeVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_child(mut self, child: ScopeNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Literal contents hoisted out of an array or object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralBuffer {
    pub id: u32,
    pub literals: Vec<Literal>,
}

/// Everything codegen produced for one function.
#[derive(Debug, Clone)]
pub struct FunctionGen {
    name: String,
    kind: FunctionKind,
    param_count: u32,
    nodes: Vec<IrNode>,
    catch_tables: Vec<CatchTable>,
    scope: Option<ScopeNode>,
    literal_buffers: Vec<LiteralBuffer>,
    source: Arc<SourceFile>,
    next_label: u32,
    next_buffer: u32,
}

impl FunctionGen {
    pub fn new(name: impl Into<String>, source: Arc<SourceFile>) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::empty(),
            param_count: 0,
            nodes: Vec::new(),
            catch_tables: Vec::new(),
            scope: None,
            literal_buffers: Vec::new(),
            source,
            next_label: 0,
            next_buffer: 0,
        }
    }

    pub fn with_kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_params(mut self, param_count: u32) -> Self {
        self.param_count = param_count;
        self
    }

    // ==========================================================================
    // Construction
    // ==========================================================================

    /// Allocate a label; place it later with [`place_label`](Self::place_label).
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Bind `label` to the next emitted instruction.
    pub fn place_label(&mut self, label: Label) {
        self.nodes.push(IrNode::Label(label));
    }

    /// Emit an instruction without a source position.
    pub fn emit(&mut self, opcode: Opcode, operands: Vec<IrOperand>) {
        self.nodes.push(IrNode::Insn(Insn {
            opcode,
            operands,
            range: None,
        }));
    }

    /// Emit an instruction selected for the node at `range`.
    pub fn emit_at(&mut self, range: SourceRange, opcode: Opcode, operands: Vec<IrOperand>) {
        self.nodes.push(IrNode::Insn(Insn {
            opcode,
            operands,
            range: Some(range),
        }));
    }

    pub fn add_catch_table(&mut self, table: CatchTable) {
        self.catch_tables.push(table);
    }

    /// Store a literal buffer under the next free id and return the id.
    pub fn add_literal_buffer(&mut self, literals: Vec<Literal>) -> u32 {
        let id = self.next_buffer;
        self.next_buffer += 1;
        self.literal_buffers.push(LiteralBuffer { id, literals });
        id
    }

    /// Store a literal buffer under an id chosen by the caller.
    pub fn push_literal_buffer(&mut self, buffer: LiteralBuffer) {
        self.next_buffer = self.next_buffer.max(buffer.id + 1);
        self.literal_buffers.push(buffer);
    }

    pub fn set_scope(&mut self, scope: ScopeNode) {
        self.scope = Some(scope);
    }

    // ==========================================================================
    // Access
    // ==========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn param_count(&self) -> u32 {
        self.param_count
    }

    pub fn nodes(&self) -> &[IrNode] {
        &self.nodes
    }

    pub fn catch_tables(&self) -> &[CatchTable] {
        &self.catch_tables
    }

    pub fn scope(&self) -> Option<&ScopeNode> {
        self.scope.as_ref()
    }

    pub fn literal_buffers(&self) -> &[LiteralBuffer] {
        &self.literal_buffers
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Number of instructions, not counting labels.
    pub fn insn_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, IrNode::Insn(_)))
            .count()
    }
}
