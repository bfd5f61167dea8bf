//! Primitive value domains and enumerations.
//!
//! Attributes take values in one of three domains: `Integer`, `Boolean`, or a
//! declared enumeration. Object-typed features (references) are not a
//! `Domain` — they're handled separately via [`crate::ids::ClassId`], since
//! they need full class/subtype resolution rather than a flat sort.

use crate::ids::EnumId;

/// The value domain of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Integer,
    Boolean,
    Enum(EnumId),
}

/// A declared enumeration: a name plus its ordered, tagged values.
///
/// Each becomes a Z3 datatype sort with one nullary constructor per value
/// (`z3::DatatypeBuilder`).
#[derive(Debug, Clone)]
pub struct Enumeration {
    pub name: String,
    pub values: Vec<String>,
}

impl Enumeration {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}
