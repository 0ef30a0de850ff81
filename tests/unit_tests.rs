//! Integration tests for module linkage and program emission.
//!
//! These tests drive the public API the way a binding pass and a codegen
//! pass would: fill a linkage record, build functions, emit a program.

use std::collections::BTreeSet;
use std::sync::Arc;

use ecmabc::compiler::assembly::{FieldValue, Operand};
use ecmabc::compiler::emit::{COMMONJS_RECORD, MODULE_RECORD_FIELD};
use ecmabc::prelude::*;
use rayon::prelude::*;

fn record(arena: &Bump) -> SourceTextModuleRecord<'_> {
    SourceTextModuleRecord::new(arena)
}

fn source(text: &str) -> Arc<SourceFile> {
    Arc::new(SourceFile::new("unit.js", text))
}

/// `function name() { return "name"; }`
fn simple_function(name: &str) -> FunctionGen {
    let mut codegen = FunctionGen::new(name, source(""));
    codegen.emit(Opcode::LdaStr, vec![IrOperand::str(name)]);
    codegen.emit(Opcode::Return, vec![]);
    codegen
}

// =============================================================================
// Module Requests
// =============================================================================

#[test]
fn test_request_dedup() {
    let arena = Bump::new();
    let mut record = record(&arena);

    let a = record.add_module_request("./a.js");
    let b = record.add_module_request("./b.js");
    let a_again = record.add_module_request("./a.js");

    assert_eq!((a.0, b.0, a_again.0), (0, 1, 0));
    assert_eq!(record.module_requests(), &["./a.js", "./b.js"]);
}

#[test]
fn test_request_dedup_is_stable_over_many_calls() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let specifiers = ["m0", "m1", "m2", "m1", "m0", "m3", "m2", "m3"];

    let indices: Vec<u32> = specifiers
        .iter()
        .map(|s| record.add_module_request(*s).0)
        .collect();

    assert_eq!(indices, vec![0, 1, 2, 1, 0, 3, 2, 3]);
    assert_eq!(record.module_requests().len(), 4);
}

// =============================================================================
// Import / Export Convergence
// =============================================================================

fn assert_converged(record: &SourceTextModuleRecord<'_>) {
    assert_eq!(record.local_exports().count(), 0);
    assert_eq!(
        record.indirect_exports(),
        &[IndirectExport::new("x", "x", ModuleRequestIdx(0))]
    );
    assert_eq!(
        record.regular_imports(),
        &[ImportEntry::new(ModuleRequestIdx(0), "x", "x")]
    );
}

#[test]
fn test_import_then_export_converges() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");

    record.add_import_entry(ImportEntry::new(m, "x", "x"));
    assert!(record.add_local_export_entry(LocalExport::new("x", "x")));

    assert_converged(&record);
}

#[test]
fn test_export_then_import_converges() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");

    assert!(record.add_local_export_entry(LocalExport::new("x", "x")));
    record.add_import_entry(ImportEntry::new(m, "x", "x"));

    assert_converged(&record);
}

#[test]
fn test_fan_out_conversion() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");

    record.add_import_entry(ImportEntry::new(m, "x", "x"));
    assert!(record.add_local_export_entry(LocalExport::new("a", "x")));
    assert!(record.add_local_export_entry(LocalExport::new("b", "x")));

    assert_eq!(record.local_exports().count(), 0);
    let names: BTreeSet<&str> = record.indirect_exports().iter().map(|e| e.export_name).collect();
    assert_eq!(names, BTreeSet::from(["a", "b"]));
    assert!(
        record
            .indirect_exports()
            .iter()
            .all(|e| e.import_name == "x" && e.module_request == m)
    );
}

#[test]
fn test_fan_out_conversion_export_first() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");

    assert!(record.add_local_export_entry(LocalExport::new("a", "x")));
    assert!(record.add_local_export_entry(LocalExport::new("b", "x")));
    record.add_import_entry(ImportEntry::new(m, "x", "x"));

    assert_eq!(record.local_exports().count(), 0);
    assert_eq!(record.indirect_exports().len(), 2);
}

// =============================================================================
// Duplicates and Star Entries
// =============================================================================

#[test]
fn test_duplicate_export_rejected() {
    let arena = Bump::new();
    let mut record = record(&arena);

    assert!(record.add_local_export_entry(LocalExport::new("x", "x")));
    let before: Vec<LocalExport<'_>> = record.local_exports().copied().collect();

    assert!(!record.add_local_export_entry(LocalExport::new("x", "y")));
    let after: Vec<LocalExport<'_>> = record.local_exports().copied().collect();
    assert_eq!(before, after);
}

#[test]
fn test_duplicate_export_via_try_helper() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");

    record.try_add_local_export_entry(LocalExport::new("x", "x")).unwrap();
    let err = record
        .try_add_indirect_export_entry(IndirectExport::new("x", "y", m))
        .unwrap_err();

    assert_eq!(err, ModuleError::duplicate_export("x"));
    let err: EcmabcError = err.into();
    assert!(err.is_module());
}

#[test]
fn test_star_exports_bypass_dedup() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");

    record.add_star_export_entry(StarExport::new(m));
    record.add_star_export_entry(StarExport::new(m));

    assert_eq!(record.star_exports(), &[StarExport::new(m), StarExport::new(m)]);
}

#[test]
fn test_namespace_import_does_not_convert() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");

    assert!(record.add_local_export_entry(LocalExport::new("ns", "ns")));
    record.add_star_import_entry(ImportEntry::namespace(m, "ns"));

    assert_eq!(record.local_exports().count(), 1);
    assert!(record.indirect_exports().is_empty());
    assert_eq!(record.namespace_imports().len(), 1);
}

#[test]
#[should_panic]
fn test_import_with_empty_local_name_panics() {
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("m");
    record.add_import_entry(ImportEntry::new(m, "x", ""));
}

// =============================================================================
// Program Emission
// =============================================================================

#[test]
fn test_concurrent_aggregation_completeness() {
    let ctx = CompileContext::new(CompileOptions::new());
    let emitter = Emitter::new(&ctx);
    let names: Vec<String> = (0..256).map(|i| format!("fn_{i}")).collect();

    names.par_iter().for_each(|name| {
        let codegen = simple_function(name);
        let artifact = FunctionEmitter::new(&codegen, &ctx).generate().unwrap();
        emitter.add_function(artifact);
    });

    let program = emitter.finalize(false);
    let emitted: BTreeSet<&str> = program.functions.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    assert_eq!(emitted, expected);
}

#[test]
fn test_concurrent_aggregation_with_scoped_threads() {
    let ctx = CompileContext::new(CompileOptions::new().with_debug(true));
    let emitter = Emitter::new(&ctx);

    std::thread::scope(|s| {
        for t in 0..4 {
            let (emitter, ctx) = (&emitter, &ctx);
            s.spawn(move || {
                for i in 0..32 {
                    let codegen = simple_function(&format!("t{t}_{i}"));
                    let artifact = FunctionEmitter::new(&codegen, ctx).generate().unwrap();
                    emitter.add_function(artifact);
                }
            });
        }
    });

    let program = emitter.finalize(false);
    assert_eq!(program.function_count(), 128);
    assert_eq!(program.strings.len(), 128);
}

#[test]
fn test_emit_program_end_to_end() {
    let ctx = CompileContext::new(CompileOptions::new().with_debug(true));
    let arena = Bump::new();
    let mut record = record(&arena);
    let m = record.add_module_request("./lib.js");
    record.add_import_entry(ImportEntry::new(m, "helper", "helper"));
    assert!(record.add_local_export_entry(LocalExport::new("helper", "helper")));
    assert!(record.add_local_export_entry(LocalExport::new("default", "main")));

    // export default function main() { if (ok) return [1, "a"]; }
    let text = "export default function main() { if (ok) return [1, \"a\"]; }";
    let mut main = FunctionGen::new("main", source(text)).with_kind(FunctionKind::MODULE_ENTRY);
    let (start, end, skip) = (main.new_label(), main.new_label(), main.new_label());
    let buffer = main.add_literal_buffer(vec![Literal::Integer(1), Literal::string("a")]);
    main.place_label(start);
    main.emit_at(SourceRange::new(37, 39), Opcode::TryLdGlobalByName, vec![IrOperand::str("ok")]);
    main.emit(Opcode::Jeqz, vec![IrOperand::Label(skip)]);
    main.emit_at(
        SourceRange::new(48, 56),
        Opcode::CreateArrayWithBuffer,
        vec![IrOperand::LiteralBuffer(buffer)],
    );
    main.emit(Opcode::Return, vec![]);
    main.place_label(skip);
    main.emit(Opcode::ReturnUndefined, vec![]);
    main.place_label(end);
    main.set_scope(ScopeNode::new(start, end).with_variable(ScopeVariable::new("tmp", 0)));

    let program = emit_program(&ctx, Some(&record), &[main, simple_function("helper")]).unwrap();

    let main = program.function("main").unwrap();
    assert_eq!(main.ins[1].operands, vec![Operand::Offset(4)]);
    assert_eq!(
        main.ins[2].operands,
        vec![Operand::LiteralArray("main#0".to_string())]
    );
    assert_eq!(main.ins[0].debug.map(|d| (d.line, d.column)), Some((1, 38)));
    assert_eq!(main.locals.len(), 1);
    assert!(main.debug.as_ref().unwrap().source_code.is_some());

    assert!(program.literal_array("main#0").is_some());
    assert!(program.strings.contains("ok"));
    assert!(program.strings.contains("a"));

    let global = program.record("_GLOBAL").unwrap();
    assert_eq!(
        global.field(MODULE_RECORD_FIELD),
        Some(&FieldValue::LiteralArray("_GLOBAL_module_record".to_string()))
    );
    let serialized = program.literal_array("_GLOBAL_module_record").unwrap();
    // one request, one regular import, no namespace imports, one local
    // export ("default"), one indirect export ("helper"), no star exports
    let counts: Vec<&Literal> = [0usize, 2, 6, 7, 10, 14]
        .iter()
        .map(|&i| &serialized.literals[i])
        .collect();
    assert_eq!(
        counts,
        vec![
            &Literal::Integer(1),
            &Literal::Integer(1),
            &Literal::Integer(0),
            &Literal::Integer(1),
            &Literal::Integer(1),
            &Literal::Integer(0),
        ]
    );
    assert!(program.record(COMMONJS_RECORD).is_none());
}

#[test]
fn test_commonjs_program() {
    let ctx = CompileContext::new(CompileOptions::new().with_commonjs(true));
    let arena = Bump::new();
    let record = record(&arena);

    let program = emit_program(&ctx, Some(&record), &[simple_function("main")]).unwrap();

    let wrapper = program.record(COMMONJS_RECORD).unwrap();
    assert_eq!(wrapper.field("isCommonJs"), Some(&FieldValue::U8(1)));
}

#[test]
fn test_emission_error_surfaces() {
    let ctx = CompileContext::new(CompileOptions::new());
    let mut broken = FunctionGen::new("broken", source(""));
    let dangling = broken.new_label();
    broken.emit(Opcode::Jmp, vec![IrOperand::Label(dangling)]);

    let err = emit_program(&ctx, None, &[broken]).unwrap_err();
    assert_eq!(
        err,
        EcmabcError::Emit(EmitError::UnboundLabel {
            function: "broken".to_string(),
            label: 0,
        })
    );
}

#[test]
fn test_mistyped_operand_surfaces() {
    let ctx = CompileContext::new(CompileOptions::new());
    let mut broken = FunctionGen::new("broken", source(""));
    broken.emit(Opcode::Jmp, vec![IrOperand::Reg(3)]);

    let err = emit_program(&ctx, None, &[simple_function("ok"), broken]).unwrap_err();
    assert_eq!(
        err,
        EcmabcError::Emit(EmitError::OperandKindMismatch {
            function: "broken".to_string(),
            opcode: "jmp",
            index: 0,
            expected: "label",
            found: "register",
        })
    );
}

#[test]
fn test_asm_dump_lists_functions_in_name_order() {
    let ctx = CompileContext::new(CompileOptions::new());
    let functions: Vec<FunctionGen> = ["b", "c", "a"].into_iter().map(simple_function).collect();
    let program = emit_program(&ctx, None, &functions).unwrap();

    let text = program.display_asm(false).to_string();
    let a = text.find(".function any a(").unwrap();
    let b = text.find(".function any b(").unwrap();
    let c = text.find(".function any c(").unwrap();
    assert!(a < b && b < c);
}
