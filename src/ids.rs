//! Small newtype identifiers for interned names.
//!
//! Classes, enums, objects, and variables are all referred to by index after
//! declaration rather than by re-hashing their name on every lookup.

use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ClassId);
id_type!(EnumId);
id_type!(ObjectId);
id_type!(VarId);
