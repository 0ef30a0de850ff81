//! Textual disassembly of a [`Program`].
//!
//! Output is deterministic: literal arrays and strings are already sorted,
//! and records and functions are printed in name order.

use std::fmt;
use std::io;

use super::{FieldValue, Function, Ins, Operand, Program, Record};

const SECTION: &str = "# ====================";

/// Displays a program as assembly text.
pub struct AsmDisplay<'a> {
    program: &'a Program,
    with_debug: bool,
}

impl Program {
    /// Assembly text of the program; `with_debug` adds line info, local
    /// variables and source files.
    pub fn display_asm(&self, with_debug: bool) -> AsmDisplay<'_> {
        AsmDisplay {
            program: self,
            with_debug,
        }
    }
}

/// Write the assembly text of `program` to `out`.
pub fn write_asm(program: &Program, out: &mut impl io::Write, with_debug: bool) -> io::Result<()> {
    write!(out, "{}", program.display_asm(with_debug))
}

impl fmt::Display for AsmDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".language ECMAScript")?;

        writeln!(f)?;
        writeln!(f, "{SECTION}")?;
        writeln!(f, "# LITERALS")?;
        writeln!(f)?;
        for (key, array) in &self.program.literal_arrays {
            write!(f, "{key} {{ {} [", array.len())?;
            for (i, literal) in array.literals.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{sep}{:?}:{literal}", literal.tag())?;
            }
            writeln!(f, " ]}}")?;
        }

        writeln!(f)?;
        writeln!(f, "{SECTION}")?;
        writeln!(f, "# RECORDS")?;
        writeln!(f)?;
        let mut records: Vec<&Record> = self.program.records.values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        for record in records {
            write_record(f, record)?;
        }

        writeln!(f)?;
        writeln!(f, "{SECTION}")?;
        writeln!(f, "# METHODS")?;
        writeln!(f)?;
        for name in self.program.function_names() {
            if let Some(func) = self.program.function(name) {
                write_function(f, func, self.with_debug)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{SECTION}")?;
        writeln!(f, "# STRINGS")?;
        writeln!(f)?;
        for s in &self.program.strings {
            writeln!(f, "{s:?}")?;
        }
        Ok(())
    }
}

fn write_record(f: &mut fmt::Formatter<'_>, record: &Record) -> fmt::Result {
    writeln!(f, ".record {} {{", record.name)?;
    for field in &record.fields {
        match &field.value {
            FieldValue::U8(v) => writeln!(f, "\tu8 {} = {v}", field.name)?,
            FieldValue::U32(v) => writeln!(f, "\tu32 {} = {v}", field.name)?,
            FieldValue::Str(v) => writeln!(f, "\tstring {} = {v:?}", field.name)?,
            FieldValue::LiteralArray(v) => writeln!(f, "\tliteral {} = {v}", field.name)?,
        }
    }
    writeln!(f, "}}")?;
    writeln!(f)
}

fn write_function(f: &mut fmt::Formatter<'_>, func: &Function, with_debug: bool) -> fmt::Result {
    write!(f, ".function any {}(", func.name)?;
    for i in 0..func.param_count {
        let sep = if i == 0 { "" } else { ", " };
        write!(f, "{sep}any a{i}")?;
    }
    writeln!(f, ") <{:?}> {{", func.kind)?;

    for (offset, ins) in func.ins.iter().enumerate() {
        write_ins(f, offset, ins, with_debug)?;
    }

    for catch in &func.catch_blocks {
        writeln!(
            f,
            "\t.catchall try @{}..@{}, catch @{}",
            catch.try_begin, catch.try_end, catch.catch_begin
        )?;
    }

    if with_debug {
        for local in &func.locals {
            writeln!(
                f,
                "\t.local {} {} v{} @{}+{}",
                local.signature, local.name, local.reg, local.start, local.length
            )?;
        }
        if let Some(debug) = &func.debug {
            writeln!(f, "\t.source {:?} checksum {:016x}", debug.file, debug.checksum)?;
        }
    }

    writeln!(f, "}}")?;
    writeln!(f)
}

fn write_ins(f: &mut fmt::Formatter<'_>, offset: usize, ins: &Ins, with_debug: bool) -> fmt::Result {
    write!(f, "\t{offset:>4}: {}", ins.opcode.name())?;
    for (i, operand) in ins.operands.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        write!(f, "{sep}{operand}")?;
    }
    match ins.debug {
        Some(debug) if with_debug => {
            writeln!(f, "\t# line {}, column {}", debug.line, debug.column)
        }
        _ => writeln!(f),
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(r) => write!(f, "v{r}"),
            Operand::Imm(v) => write!(f, "{v}"),
            Operand::Double(v) => write!(f, "{:?}", v.0),
            Operand::Str(s) => write!(f, "{s:?}"),
            Operand::Func(name) => write!(f, "{name}"),
            Operand::LiteralArray(key) => write!(f, "{key}"),
            Operand::Offset(o) => write!(f, "@{o}"),
        }
    }
}
