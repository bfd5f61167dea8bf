#![cfg_attr(docsrs, feature(doc_cfg))]

//! # closedworld
//!
//! Compiles closed-world object/relation models — classes with attributes,
//! references, single inheritance, and a finite universe of named objects
//! — into first-order logic formulas, and dispatches them to Z3.
//!
//! ## Quick Start
//!
//! ```ignore
//! use closedworld::compiler::ModelContext;
//! use closedworld::domain::Domain;
//! use closedworld::solver::Checker;
//! use z3::{Config, Context};
//!
//! let cfg = Config::new();
//! let z3ctx = Context::new(&cfg);
//! let mut ctx = ModelContext::new(&z3ctx);
//!
//! let person = ctx.define_class("Person", None, false)?;
//! ctx.define_attribute(person, "age", Domain::Integer, false)?;
//! let alice = ctx.define_object("alice", person, false)?;
//! ctx.force_value(alice, "age", closedworld::objects::ForcedValue::Int(30));
//!
//! ctx.generate_meta_constraints()?;
//! ctx.generate_config_constraints()?;
//!
//! let mut checker = Checker::new(&z3ctx);
//! checker.assert_all(ctx.all_facts());
//! assert!(checker.check().is_sat());
//! # Ok::<(), closedworld::error::ModelError>(())
//! ```
//!
//! ## Architecture
//!
//! Two sorts anchor the whole model: `Type` (one constant per declared
//! class, plus `NilType`) and `Inst` (one constant per declared object,
//! plus `nil`). Every feature becomes an uninterpreted Z3 function over
//! these sorts. The class graph and object graph are asserted as two
//! separate fact sets — "meta facts" (schema-level, cheap to regenerate)
//! and "config facts" (object-level) — so that changing which objects
//! exist doesn't force re-deriving the whole subtype lattice.
//!
//! | Model concept | Z3 encoding |
//! |----------------|-------------|
//! | Class | `Type`-sorted constant |
//! | Object | `Inst`-sorted constant |
//! | Attribute | Uninterpreted function `Inst -> Domain` |
//! | Single reference | Uninterpreted function `Inst -> Inst` |
//! | Multi-valued feature | Uninterpreted function `Inst × Value -> Bool` |
//! | Quantified expression | `forall_const`/`exists_const` over the guard |
//!
//! ## Modules
//!
//! - [`ids`] — newtype identifiers for classes, enums, objects, variables
//! - [`domain`] — primitive value domains and enumerations
//! - [`schema`] — class/feature declarations and supertype resolution
//! - [`objects`] — the closed, finite object registry
//! - [`vars`] — free-variable declarations for quantifiers
//! - [`smt`] — the persistent Z3 bindings (sorts, built-in predicates, caches)
//! - [`universe`] — meta/config fact generation
//! - [`compiler`] — [`compiler::ModelContext`], the top-level orchestrator
//! - [`expr`] — the expression algebra (sets, joins, quantifiers, aggregation)
//! - [`decode`] — turning a solved model back into object/feature values
//! - [`schema_loader`] — loading a class/enum schema from YAML
//! - [`solver`] — the Z3 solver facade ([`solver::Checker`], [`solver::Optimizer`])
//! - [`error`] — the crate's error taxonomy

pub mod compiler;
pub mod decode;
pub mod domain;
pub mod error;
pub mod expr;
pub mod ids;
pub mod objects;
pub mod schema;
pub mod schema_loader;
pub mod smt;
pub mod solver;
pub mod universe;
pub mod vars;

pub use compiler::ModelContext;
pub use error::{ModelError, Result};
pub use solver::{Checker, Optimizer, SolverOutcome};
