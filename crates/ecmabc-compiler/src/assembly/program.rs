//! The program artifact handed to the bytecode writer.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use super::{Function, LiteralArray};

/// Value of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    U8(u8),
    U32(u32),
    Str(String),
    /// Key into [`Program::literal_arrays`].
    LiteralArray(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// A named group of program-level metadata fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push(Field {
            name: name.into(),
            value,
        });
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// A complete program: functions, records, literal arrays and the
/// deduplicated string table.
///
/// Functions are addressed by name; their iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub functions: FxHashMap<String, Function>,
    pub records: FxHashMap<String, Record>,
    pub literal_arrays: BTreeMap<String, LiteralArray>,
    pub strings: BTreeSet<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn record(&self, name: &str) -> Option<&Record> {
        self.records.get(name)
    }

    pub fn literal_array(&self, key: &str) -> Option<&LiteralArray> {
        self.literal_arrays.get(key)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Function names in sorted order.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
