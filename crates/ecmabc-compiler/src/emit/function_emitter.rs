//! Turns one function's codegen output into a [`FunctionArtifact`].
//!
//! The emitter runs in the producer's thread and touches nothing shared:
//! labels are resolved to instruction offsets, literal buffers are keyed
//! program-wide, and every string the function needs is collected so the
//! aggregator only has to merge sets.
//!
//! Debug builds additionally carry a line and column per instruction, the
//! variables of the scope tree, and the source file checksum. Module entry
//! functions also carry the full source text.

use std::collections::BTreeSet;

use ecmabc_core::{CompileContext, EmitError};
use ordered_float::OrderedFloat;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use xxhash_rust::xxh64::xxh64;

use crate::assembly::{
    CatchBlock, Function, FunctionKind, Ins, InsDebug, LiteralArray, LocalVariable, Operand,
    SourceDebugInfo, literal_array_key,
};
use crate::ir::{FunctionGen, IrNode, IrOperand, Label, ScopeNode};

/// Signature recorded for every local variable. Values are untyped.
const ANY_SIGNATURE: &str = "any";

/// The finished, self-contained output for one function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionArtifact {
    function: Function,
    literal_buffers: Vec<(u32, LiteralArray)>,
    strings: BTreeSet<String>,
}

impl FunctionArtifact {
    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Literal buffers by function-local id.
    pub fn literal_buffers(&self) -> &[(u32, LiteralArray)] {
        &self.literal_buffers
    }

    /// Strings referenced by instructions and literal buffers.
    pub fn strings(&self) -> &BTreeSet<String> {
        &self.strings
    }

    pub fn into_parts(self) -> (Function, Vec<(u32, LiteralArray)>, BTreeSet<String>) {
        (self.function, self.literal_buffers, self.strings)
    }
}

/// Emits a single function.
///
/// Consumed by [`generate`](Self::generate), so an emitter runs exactly once.
pub struct FunctionEmitter<'a> {
    codegen: &'a FunctionGen,
    is_debug: bool,
    func: Function,
    label_offsets: FxHashMap<Label, u32>,
    buffer_ids: FxHashSet<u32>,
    strings: BTreeSet<String>,
}

impl<'a> FunctionEmitter<'a> {
    pub fn new(codegen: &'a FunctionGen, ctx: &CompileContext) -> Self {
        Self {
            codegen,
            is_debug: ctx.is_debug(),
            func: Function::new(codegen.name(), codegen.kind(), codegen.param_count()),
            label_offsets: FxHashMap::default(),
            buffer_ids: FxHashSet::default(),
            strings: BTreeSet::new(),
        }
    }

    /// Build the artifact.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(mut self) -> Result<FunctionArtifact, EmitError> {
        self.resolve_labels();

        // Buffers first so instructions can check the ids they reference.
        let literal_buffers = self.gen_literal_buffers()?;
        self.gen_function_instructions()?;
        self.gen_function_catch_tables()?;

        if self.is_debug {
            self.gen_variables_debug_info()?;
            self.gen_source_file_debug_info();
        }

        debug!(
            function = %self.func.name,
            instructions = self.func.ins.len(),
            literal_buffers = literal_buffers.len(),
            strings = self.strings.len(),
            "function emitted"
        );

        Ok(FunctionArtifact {
            function: self.func,
            literal_buffers,
            strings: self.strings,
        })
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    /// A label resolves to the offset of the instruction that follows it, or
    /// to the instruction count when nothing follows.
    fn resolve_labels(&mut self) {
        let mut offset = 0u32;
        for node in self.codegen.nodes() {
            match node {
                IrNode::Label(label) => {
                    self.label_offsets.insert(*label, offset);
                }
                IrNode::Insn(_) => offset += 1,
            }
        }
    }

    fn offset_of(&self, label: Label) -> Result<u32, EmitError> {
        self.label_offsets
            .get(&label)
            .copied()
            .ok_or_else(|| EmitError::UnboundLabel {
                function: self.func.name.clone(),
                label: label.0,
            })
    }

    // ==========================================================================
    // Instructions
    // ==========================================================================

    fn gen_function_instructions(&mut self) -> Result<(), EmitError> {
        let codegen = self.codegen;
        self.func.ins.reserve(codegen.insn_count());

        for node in codegen.nodes() {
            let IrNode::Insn(insn) = node else {
                continue;
            };

            let expected = insn.opcode.operand_count();
            if insn.operands.len() != expected {
                return Err(EmitError::OperandCountMismatch {
                    function: self.func.name.clone(),
                    opcode: insn.opcode.name(),
                    expected,
                    found: insn.operands.len(),
                });
            }

            let slots = insn.opcode.operands().iter().zip(&insn.operands);
            if let Some((index, (slot, operand))) = slots
                .enumerate()
                .find(|(_, (slot, operand))| operand.kind() != **slot)
            {
                return Err(EmitError::OperandKindMismatch {
                    function: self.func.name.clone(),
                    opcode: insn.opcode.name(),
                    index,
                    expected: slot.name(),
                    found: operand.kind().name(),
                });
            }

            let operands = insn
                .operands
                .iter()
                .map(|operand| self.gen_operand(operand))
                .collect::<Result<Vec<_>, _>>()?;

            let debug = match insn.range {
                Some(range) if self.is_debug => {
                    let loc = codegen.source().line_index().location(range.start);
                    Some(InsDebug {
                        line: loc.line,
                        column: loc.col,
                    })
                }
                _ => None,
            };

            self.func.ins.push(Ins {
                opcode: insn.opcode,
                operands,
                debug,
            });
        }
        Ok(())
    }

    fn gen_operand(&mut self, operand: &IrOperand) -> Result<Operand, EmitError> {
        Ok(match operand {
            IrOperand::Reg(reg) => Operand::Reg(*reg),
            IrOperand::Imm(value) => Operand::Imm(*value),
            IrOperand::Double(value) => Operand::Double(OrderedFloat(*value)),
            IrOperand::Str(value) => {
                self.strings.insert(value.clone());
                Operand::Str(value.clone())
            }
            IrOperand::Func(name) => Operand::Func(name.clone()),
            IrOperand::LiteralBuffer(id) => {
                if !self.buffer_ids.contains(id) {
                    return Err(EmitError::UnknownLiteralBuffer {
                        function: self.func.name.clone(),
                        id: *id,
                    });
                }
                Operand::LiteralArray(literal_array_key(&self.func.name, *id))
            }
            IrOperand::Label(label) => Operand::Offset(self.offset_of(*label)?),
        })
    }

    fn gen_function_catch_tables(&mut self) -> Result<(), EmitError> {
        for table in self.codegen.catch_tables() {
            let block = CatchBlock {
                try_begin: self.offset_of(table.try_begin)?,
                try_end: self.offset_of(table.try_end)?,
                catch_begin: self.offset_of(table.catch_begin)?,
            };
            self.func.catch_blocks.push(block);
        }
        Ok(())
    }

    fn gen_literal_buffers(&mut self) -> Result<Vec<(u32, LiteralArray)>, EmitError> {
        let buffers = self.codegen.literal_buffers();
        let mut out = Vec::with_capacity(buffers.len());

        for buffer in buffers {
            if !self.buffer_ids.insert(buffer.id) {
                return Err(EmitError::DuplicateLiteralBuffer {
                    function: self.func.name.clone(),
                    id: buffer.id,
                });
            }
            let array = LiteralArray::new(buffer.literals.clone());
            self.strings.extend(array.strings().map(str::to_string));
            out.push((buffer.id, array));
        }
        Ok(out)
    }

    // ==========================================================================
    // Debug Info
    // ==========================================================================

    fn gen_variables_debug_info(&mut self) -> Result<(), EmitError> {
        let codegen = self.codegen;
        if let Some(scope) = codegen.scope() {
            self.gen_scope_variables(scope)?;
        }
        Ok(())
    }

    fn gen_scope_variables(&mut self, scope: &ScopeNode) -> Result<(), EmitError> {
        let start = self.offset_of(scope.start)?;
        let end = self.offset_of(scope.end)?;

        for variable in &scope.variables {
            self.func.locals.push(LocalVariable {
                name: variable.name.clone(),
                signature: ANY_SIGNATURE.to_string(),
                reg: variable.reg,
                start,
                length: end.saturating_sub(start),
            });
        }
        for child in &scope.children {
            self.gen_scope_variables(child)?;
        }
        Ok(())
    }

    fn gen_source_file_debug_info(&mut self) {
        let source = self.codegen.source();
        let checksum = xxh64(source.text().as_bytes(), 0);
        trace!(function = %self.func.name, file = source.path(), checksum, "source debug info");

        self.func.debug = Some(SourceDebugInfo {
            file: source.path().to_string(),
            checksum,
            source_code: self
                .func
                .kind
                .contains(FunctionKind::MODULE_ENTRY)
                .then(|| source.text().to_string()),
        });
    }
}
