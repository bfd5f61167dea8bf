//! Error taxonomy for the modeling and compilation layers.
//!
//! Three synchronous, unrecoverable-at-the-call-site categories:
//!
//! - [`SchemaError`] — malformed class/object declarations.
//! - [`BindingError`] — misuse of the expression algebra (unbound free
//!   variables, wrong-kind terms, etc).
//! - [`OrderingError`] — an operation invoked before its prerequisite phase.
//!
//! `sat` / `unsat` / `unknown` are **not** errors — see
//! [`crate::solver::SolverOutcome`]. `unsat_core` is only meaningful after an
//! `unsat` result.

use std::fmt;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;

/// The union of every error category the crate can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Schema(SchemaError),
    Binding(BindingError),
    Ordering(OrderingError),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Schema(e) => write!(f, "{e}"),
            ModelError::Binding(e) => write!(f, "{e}"),
            ModelError::Ordering(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<SchemaError> for ModelError {
    fn from(e: SchemaError) -> Self {
        ModelError::Schema(e)
    }
}

impl From<BindingError> for ModelError {
    fn from(e: BindingError) -> Self {
        ModelError::Binding(e)
    }
}

impl From<OrderingError> for ModelError {
    fn from(e: OrderingError) -> Self {
        ModelError::Ordering(e)
    }
}

/// Errors raised while declaring classes, features, or objects.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A class name was declared twice.
    DuplicateClass { name: String },
    /// A class named an undeclared supertype.
    UnknownSupertype { class: String, supertype: String },
    /// `attribute`/`reference` named a type string that resolves to neither
    /// a primitive, a declared enum, nor a declared class.
    UnknownType { feature: String, type_name: String },
    /// An `opposite` pointed at a feature that doesn't exist on the target
    /// class, or that isn't itself a reference back to a compatible type.
    UnknownOpposite {
        reference: String,
        target_class: String,
        opposite: String,
    },
    /// Two declarations of the same feature name disagree on shape (domain,
    /// multiplicity) — features are globally keyed by name, so they must be
    /// the same logical function everywhere they appear.
    IncompatibleFeatureRedeclaration { feature: String },
    /// A non-suspended object was declared against an abstract class; it
    /// would be forced alive and forced abstract in the same breath.
    AbstractLiveObject { object: String, class: String },
    /// An object name, class name, or variable identifier collided with one
    /// already registered.
    DuplicateName { kind: &'static str, name: String },
    /// A feature referenced an enum variant that doesn't exist.
    UnknownEnumValue { enum_name: String, value: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DuplicateClass { name } => {
                write!(f, "class \"{name}\" is already declared")
            }
            SchemaError::UnknownSupertype { class, supertype } => {
                write!(f, "class \"{class}\" names undeclared supertype \"{supertype}\"")
            }
            SchemaError::UnknownType { feature, type_name } => {
                write!(f, "feature \"{feature}\" names unknown type \"{type_name}\"")
            }
            SchemaError::UnknownOpposite {
                reference,
                target_class,
                opposite,
            } => write!(
                f,
                "reference \"{reference}\" names opposite \"{opposite}\" which is not a reference on \"{target_class}\""
            ),
            SchemaError::IncompatibleFeatureRedeclaration { feature } => write!(
                f,
                "feature \"{feature}\" is redeclared with a different domain or multiplicity"
            ),
            SchemaError::AbstractLiveObject { object, class } => write!(
                f,
                "object \"{object}\" is declared live (not suspended) against abstract class \"{class}\""
            ),
            SchemaError::DuplicateName { kind, name } => {
                write!(f, "{kind} name \"{name}\" is already used")
            }
            SchemaError::UnknownEnumValue { enum_name, value } => {
                write!(f, "\"{value}\" is not a value of enum \"{enum_name}\"")
            }
        }
    }
}

/// Errors raised by misuse of the expression algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingError {
    /// `complete()` was called with one or more slots still unbound.
    UnboundSlot { var: String },
    /// The same slot was bound twice.
    DoubleBind { var: String },
    /// A feature access named something not defined on the term's class
    /// (walking the supertype chain).
    UnknownFeature { class: String, feature: String },
    /// An operation expected an object-typed term but got a primitive one,
    /// or vice versa.
    WrongKind { expected: &'static str, found: &'static str },
    /// A simple-set operation (`map`, `contains`, `sum`, `count`,
    /// `exists_one`, set-literal `==`) was invoked on a joined/compound set.
    CompoundSetNotSimple { operation: &'static str },
    /// `map`/`filter` was attempted on a set whose element is itself a set.
    SetOfSets,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::UnboundSlot { var } => {
                write!(f, "free variable \"{var}\" is not bound")
            }
            BindingError::DoubleBind { var } => {
                write!(f, "slot for \"{var}\" was bound twice")
            }
            BindingError::UnknownFeature { class, feature } => write!(
                f,
                "\"{feature}\" is not defined on class \"{class}\" or any ancestor"
            ),
            BindingError::WrongKind { expected, found } => {
                write!(f, "expected a {expected} term, found a {found} term")
            }
            BindingError::CompoundSetNotSimple { operation } => write!(
                f,
                "{operation} only works on a simple set; this set is a join product"
            ),
            BindingError::SetOfSets => write!(f, "a set of sets is not supported"),
        }
    }
}

/// Errors raised when an operation runs before its required phase.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderingError {
    /// `sum`/`count` used before `generate_config_constraints` finalized the
    /// object universe.
    AggregationBeforeConfig,
    /// A reference to an object name that hasn't been declared yet.
    UndeclaredObject { name: String },
    /// A reference to a class name that hasn't been declared yet.
    UndeclaredClass { name: String },
    /// `unsat_core()` was requested without a preceding `unsat` check.
    NoUnsatCore,
}

impl fmt::Display for OrderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingError::AggregationBeforeConfig => write!(
                f,
                "sum/count can only be used after generate_config_constraints"
            ),
            OrderingError::UndeclaredObject { name } => {
                write!(f, "object \"{name}\" has not been declared")
            }
            OrderingError::UndeclaredClass { name } => {
                write!(f, "class \"{name}\" has not been declared")
            }
            OrderingError::NoUnsatCore => write!(
                f,
                "unsat_core is only available after check(assumptions) returned unsat"
            ),
        }
    }
}
