//! Literal values and literal arrays.
//!
//! A literal array is a side table of tagged values referenced by index from
//! an instruction, which keeps array/object literal contents and the
//! serialized module record out of the instruction stream.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use ordered_float::OrderedFloat;

/// Tag written in front of each literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum LiteralTag {
    Bool = 1,
    Integer = 2,
    Double = 4,
    String = 5,
    Method = 6,
    GeneratorMethod = 7,
    Accessor = 8,
    MethodAffiliate = 9,
    NullValue = 255,
}

/// A single tagged literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Bool(bool),
    Integer(u32),
    Double(OrderedFloat<f64>),
    String(String),
    /// Method defined by the literal, by function name.
    Method(String),
    GeneratorMethod(String),
    /// Small index attached to the previous entry (parameter counts, module
    /// request indices).
    MethodAffiliate(u16),
    /// Placeholder for a getter/setter pair.
    Accessor,
    Null,
}

impl Literal {
    pub fn double(value: f64) -> Self {
        Literal::Double(OrderedFloat(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Literal::String(value.into())
    }

    pub fn tag(&self) -> LiteralTag {
        match self {
            Literal::Bool(_) => LiteralTag::Bool,
            Literal::Integer(_) => LiteralTag::Integer,
            Literal::Double(_) => LiteralTag::Double,
            Literal::String(_) => LiteralTag::String,
            Literal::Method(_) => LiteralTag::Method,
            Literal::GeneratorMethod(_) => LiteralTag::GeneratorMethod,
            Literal::MethodAffiliate(_) => LiteralTag::MethodAffiliate,
            Literal::Accessor => LiteralTag::Accessor,
            Literal::Null => LiteralTag::NullValue,
        }
    }

    /// The string payload, if this literal carries one that belongs in the
    /// program string table.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Integer(v) => write!(f, "{v}"),
            Literal::Double(v) => write!(f, "{:?}", v.0),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Method(name) | Literal::GeneratorMethod(name) => write!(f, "{name}"),
            Literal::MethodAffiliate(v) => write!(f, "{v}"),
            Literal::Accessor => write!(f, "accessor"),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// An ordered sequence of literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LiteralArray {
    pub literals: Vec<Literal>,
}

impl LiteralArray {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Strings stored in the array.
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.literals.iter().filter_map(Literal::as_str)
    }
}

/// Program-wide key of a function's literal buffer.
///
/// Buffer ids are only unique within their function, so the key carries the
/// function name.
pub fn literal_array_key(function: &str, id: u32) -> String {
    format!("{function}#{id}")
}
