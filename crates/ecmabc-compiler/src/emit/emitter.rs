//! Program aggregation.
//!
//! One [`Emitter`] exists per compilation. Function emitters run on any
//! number of threads and hand their artifacts to [`Emitter::add_function`];
//! the module record arrives once through
//! [`Emitter::add_source_text_module_record`]. Both take `&self` and hold the
//! program lock only while inserting already-built values.
//!
//! [`Emitter::finalize`] takes the emitter by value, so every producer must
//! have released its borrow (joined) before the program can be read.

use std::collections::hash_map::Entry;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ecmabc_core::CompileContext;
use tracing::{debug, trace, warn};

use super::{FunctionArtifact, SerializedModuleRecord};
use crate::assembly::{FieldValue, LiteralArray, Program, Record, literal_array_key, write_asm};

/// Field of the main record pointing at the serialized module record.
pub const MODULE_RECORD_FIELD: &str = "moduleRecordIdx";
/// Field of the main record holding the commonjs flag.
pub const COMMONJS_FIELD: &str = "isCommonjs";
/// Wrapper record synthesized for commonjs modules.
pub const COMMONJS_RECORD: &str = "_CommonJsRecord";
const COMMONJS_RECORD_FIELD: &str = "isCommonJs";

struct ProgramState {
    program: Program,
    /// Captured when the module record is registered.
    commonjs: Option<bool>,
}

/// Collects function artifacts and the module record into one [`Program`].
pub struct Emitter {
    record_name: String,
    state: Mutex<ProgramState>,
}

impl Emitter {
    /// Create an empty program holding only the main record.
    pub fn new(ctx: &CompileContext) -> Self {
        let record_name = ctx.record_name().to_string();
        let mut program = Program::new();
        program
            .records
            .insert(record_name.clone(), Record::new(record_name.as_str()));

        Self {
            record_name,
            state: Mutex::new(ProgramState {
                program,
                commonjs: None,
            }),
        }
    }

    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Number of functions registered so far.
    pub fn function_count(&self) -> usize {
        self.lock().program.functions.len()
    }

    /// Add a finished function with its literal arrays and strings.
    ///
    /// # Panics
    ///
    /// Panics if a function with the same name was already added.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn add_function(&self, artifact: FunctionArtifact) {
        let (function, literal_buffers, strings) = artifact.into_parts();
        let name = function.name.clone();
        let arrays: Vec<(String, LiteralArray)> = literal_buffers
            .into_iter()
            .map(|(id, array)| (literal_array_key(&name, id), array))
            .collect();
        let array_count = arrays.len();

        let duplicate = {
            let mut state = self.lock();
            let program = &mut state.program;
            match program.functions.entry(name.clone()) {
                Entry::Occupied(_) => true,
                Entry::Vacant(slot) => {
                    slot.insert(function);
                    program.literal_arrays.extend(arrays);
                    program.strings.extend(strings);
                    false
                }
            }
        };

        assert!(!duplicate, "function '{name}' was added to the program twice");
        trace!(function = %name, literal_arrays = array_count, "function added");
    }

    /// Attach the serialized module record to the main record.
    ///
    /// The commonjs flag is read from `ctx` here and never again.
    ///
    /// # Panics
    ///
    /// Panics if a module record was already registered.
    pub fn add_source_text_module_record(
        &self,
        record: SerializedModuleRecord,
        ctx: &CompileContext,
    ) {
        let key = format!("{}_module_record", self.record_name);
        let is_commonjs = ctx.is_commonjs();

        let registered_before = {
            let mut state = self.lock();
            if state.commonjs.is_some() {
                true
            } else {
                state.commonjs = Some(is_commonjs);
                let program = &mut state.program;
                program
                    .literal_arrays
                    .insert(key.clone(), record.into_literal_array());

                let main = program
                    .records
                    .entry(self.record_name.clone())
                    .or_insert_with(|| Record::new(self.record_name.as_str()));
                main.add_field(COMMONJS_FIELD, FieldValue::U8(u8::from(is_commonjs)));
                main.add_field(MODULE_RECORD_FIELD, FieldValue::LiteralArray(key.clone()));
                false
            }
        };

        assert!(
            !registered_before,
            "module record of '{}' was registered twice",
            self.record_name
        );
        debug!(record = %self.record_name, key = %key, commonjs = is_commonjs, "module record added");
    }

    /// Close the program.
    ///
    /// With `dump_debug_info` the disassembly, including debug info, is
    /// written to stdout.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finalize(self, dump_debug_info: bool) -> Program {
        let ProgramState {
            mut program,
            commonjs,
        } = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        if commonjs == Some(true) {
            let mut record = Record::new(COMMONJS_RECORD);
            record.add_field(COMMONJS_RECORD_FIELD, FieldValue::U8(1));
            program.records.insert(COMMONJS_RECORD.to_string(), record);
        }

        debug!(
            record = %self.record_name,
            functions = program.functions.len(),
            literal_arrays = program.literal_arrays.len(),
            strings = program.strings.len(),
            "program finalized"
        );

        if dump_debug_info {
            dump(&program, true);
        }
        program
    }

    /// Write the disassembly of `program` to stdout.
    pub fn dump_asm(program: &Program) {
        dump(program, false);
    }

    fn lock(&self) -> MutexGuard<'_, ProgramState> {
        // Insertions never leave the program half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn dump(program: &Program, with_debug: bool) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = write_asm(program, &mut out, with_debug).and_then(|()| out.flush()) {
        warn!(error = %err, "failed to write program assembly");
    }
}
