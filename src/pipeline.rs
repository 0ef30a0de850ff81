//! One compilation unit from codegen output to program.

use std::num::NonZeroUsize;
use std::panic;
use std::thread;

use ecmabc_compiler::{
    Emitter, FunctionEmitter, FunctionGen, ModuleRecordEmitter, Program,
};
use ecmabc_core::{CompileContext, EcmabcError, EmitError};
use ecmabc_module::SourceTextModuleRecord;
use tracing::{debug, info};

/// Emit every function of a module, attach its linkage record and finalize.
///
/// Functions are split across up to `available_parallelism` scoped threads.
/// The first emission error is returned; artifacts already added are
/// discarded with the unfinished program.
///
/// # Panics
///
/// Panics if two functions share a name.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn emit_program(
    ctx: &CompileContext,
    record: Option<&SourceTextModuleRecord<'_>>,
    functions: &[FunctionGen],
) -> Result<Program, EcmabcError> {
    info!(
        record = ctx.record_name(),
        functions = functions.len(),
        debug = ctx.is_debug(),
        "emitting program"
    );

    let emitter = Emitter::new(ctx);
    let workers = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .min(functions.len())
        .max(1);
    let chunk_size = functions.len().div_ceil(workers).max(1);

    thread::scope(|s| -> Result<(), EcmabcError> {
        let handles: Vec<_> = functions
            .chunks(chunk_size)
            .map(|chunk| {
                let emitter = &emitter;
                s.spawn(move || -> Result<(), EmitError> {
                    for codegen in chunk {
                        let artifact = FunctionEmitter::new(codegen, ctx).generate()?;
                        emitter.add_function(artifact);
                    }
                    Ok(())
                })
            })
            .collect();

        // The record is serialized here while workers run.
        if let Some(record) = record {
            let serialized = ModuleRecordEmitter::new(record).generate();
            emitter.add_source_text_module_record(serialized, ctx);
        }

        let mut first_error = None;
        for handle in handles {
            let result = handle
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    })?;

    debug!(workers, chunk_size, "all functions emitted");

    let program = emitter.finalize(ctx.dump_debug_info());
    if ctx.dump_asm() {
        Emitter::dump_asm(&program);
    }

    info!(
        record = ctx.record_name(),
        functions = program.functions.len(),
        literal_arrays = program.literal_arrays.len(),
        "program emitted"
    );
    Ok(program)
}
