//! Z3 solver facade over a [`crate::compiler::ModelContext`].
//!
//! ## [`Checker`]
//!
//! Owns the `z3::Solver`, asserts the context's meta/config facts plus any
//! user-supplied formulas, and runs `check()`/`check_assumptions()`. A
//! [`Scope`] guard provides scoped push/pop: every push must release on
//! every exit path, including early return and panic.
//!
//! ```ignore
//! use closedworld::solver::Checker;
//!
//! let mut checker = Checker::new(&ctx);
//! checker.assert_all(model_ctx.all_facts());
//! match checker.check() {
//!     SolverOutcome::Sat => { /* decode the model */ }
//!     SolverOutcome::Unsat => { /* inspect unsat_core() */ }
//!     SolverOutcome::Unknown(reason) => { /* solver gave up */ }
//! }
//! ```
//!
//! ## Timeouts
//!
//! [`Checker::new`] applies a default solver timeout; override it with
//! [`Checker::with_timeout_ms`] before asserting anything.
//!
//! ## [`Optimizer`]
//!
//! A second facade over `z3::Optimize`, for the `maximize`/`minimize(term)`
//! half of the solver surface. VM-cost minimization is the motivating
//! case: assert the model's facts, add a `minimize` objective, `check()`,
//! then read the optimal value back off the returned model the same way
//! [`Checker`] callers would.

use std::collections::HashMap;

use z3::ast::{Ast, Bool, Dynamic};
use z3::{Config, Context, Optimize, SatResult, Solver};

/// The result of a single `check()`/`check_assumptions()` call. Not an
/// error: `sat`, `unsat`, and `unknown` are all valid, expected outcomes
/// of SMT solving (see `crate::error` module docs).
#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    Sat,
    Unsat,
    /// The solver could not decide within its resource bounds; carries
    /// Z3's `reason_unknown()` string when available.
    Unknown(Option<String>),
}

impl SolverOutcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolverOutcome::Sat)
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, SolverOutcome::Unsat)
    }
}

/// Thin wrapper over `z3::Solver` that tracks whether the last check was
/// `unsat` (so `unsat_core()` can refuse to run otherwise) and named
/// assumptions for unsat-core extraction.
pub struct Checker<'ctx> {
    ctx: &'ctx Context,
    solver: Solver<'ctx>,
    last_was_unsat: bool,
    tracked: HashMap<String, Bool<'ctx>>,
}

impl<'ctx> Checker<'ctx> {
    /// Default solver timeout, matching the 10-second budget a single-shot
    /// `Verifier` used — generous enough for the closed, finite universes
    /// this crate checks.
    pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

    pub fn new(ctx: &'ctx Context) -> Self {
        let solver = Solver::new(ctx);
        let mut checker = Self {
            ctx,
            solver,
            last_was_unsat: false,
            tracked: HashMap::new(),
        };
        checker.with_timeout_ms(Self::DEFAULT_TIMEOUT_MS);
        checker
    }

    /// Build a solver-local `Config` with a custom timeout. Only affects
    /// solvers created after this call, since `z3::Context` bakes its
    /// config in at construction — callers who need a non-default timeout
    /// from the very first check should build their own `Context` with
    /// [`Checker::config_with_timeout`] instead.
    pub fn config_with_timeout(timeout_ms: u32) -> Config {
        let mut cfg = Config::new();
        cfg.set_param_value("timeout", &timeout_ms.to_string());
        cfg
    }

    fn with_timeout_ms(&mut self, timeout_ms: u32) {
        let params = z3::Params::new(self.ctx);
        params.set_u32("timeout", timeout_ms);
        self.solver.set_params(&params);
    }

    pub fn assert(&mut self, fact: &Bool<'ctx>) {
        self.solver.assert(fact);
    }

    pub fn assert_all(&mut self, facts: impl IntoIterator<Item = Bool<'ctx>>) {
        for fact in facts {
            self.solver.assert(&fact);
        }
    }

    /// Assert `fact` under a name, retrievable later via
    /// [`Checker::unsat_core`] if it turns out to be part of the
    /// contradiction.
    pub fn assert_tracked(&mut self, label: impl Into<String>, fact: &Bool<'ctx>) {
        let label = label.into();
        let tracker = Bool::new_const(self.ctx, label.clone());
        self.solver.assert_and_track(fact, &tracker);
        self.tracked.insert(label, tracker);
    }

    pub fn check(&mut self) -> SolverOutcome {
        let result = self.solver.check();
        self.last_was_unsat = matches!(result, SatResult::Unsat);
        self.to_outcome(result)
    }

    pub fn check_assumptions(&mut self, assumptions: &[Bool<'ctx>]) -> SolverOutcome {
        let refs: Vec<&Bool<'ctx>> = assumptions.iter().collect();
        let result = self.solver.check_assumptions(&refs);
        self.last_was_unsat = matches!(result, SatResult::Unsat);
        self.to_outcome(result)
    }

    fn to_outcome(&self, result: SatResult) -> SolverOutcome {
        match result {
            SatResult::Sat => SolverOutcome::Sat,
            SatResult::Unsat => SolverOutcome::Unsat,
            SatResult::Unknown => SolverOutcome::Unknown(self.solver.get_reason_unknown()),
        }
    }

    /// The unsatisfiable core from the most recent `check()`, as the
    /// labels passed to [`Checker::assert_tracked`]. Errors if the last
    /// check wasn't `unsat`.
    pub fn unsat_core(&self) -> crate::error::Result<Vec<String>> {
        if !self.last_was_unsat {
            return Err(crate::error::OrderingError::NoUnsatCore.into());
        }
        let core = self.solver.get_unsat_core();
        let labels = core
            .iter()
            .filter_map(|tracker| {
                self.tracked
                    .iter()
                    .find(|(_, t)| t.to_string() == tracker.to_string())
                    .map(|(label, _)| label.clone())
            })
            .collect();
        Ok(labels)
    }

    pub fn model(&self) -> Option<z3::Model<'ctx>> {
        self.solver.get_model()
    }

    /// Push a scope that pops on drop, even if the caller returns early or
    /// a later call panics.
    pub fn scope(&mut self) -> Scope<'_, 'ctx> {
        self.solver.push();
        Scope { checker: self }
    }
}

/// RAII guard for a pushed solver scope. Pops exactly once, on drop.
pub struct Scope<'a, 'ctx> {
    checker: &'a mut Checker<'ctx>,
}

impl<'a, 'ctx> Scope<'a, 'ctx> {
    pub fn assert(&mut self, fact: &Bool<'ctx>) {
        self.checker.assert(fact);
    }

    pub fn check(&mut self) -> SolverOutcome {
        self.checker.check()
    }
}

impl<'a, 'ctx> Drop for Scope<'a, 'ctx> {
    fn drop(&mut self) {
        self.checker.solver.pop(1);
    }
}

/// Facade over `z3::Optimize`, for objective-directed search
/// (`maximize`/`minimize`) rather than plain satisfiability. Kept separate
/// from [`Checker`] since Z3 itself splits the two solver kinds — an
/// `Optimize` instance has no `unsat_core`, and a plain `Solver` has no
/// objectives.
pub struct Optimizer<'ctx> {
    ctx: &'ctx Context,
    opt: Optimize<'ctx>,
}

impl<'ctx> Optimizer<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            opt: Optimize::new(ctx),
        }
    }

    pub fn assert(&mut self, fact: &Bool<'ctx>) {
        self.opt.assert(fact);
    }

    pub fn assert_all(&mut self, facts: impl IntoIterator<Item = Bool<'ctx>>) {
        for fact in facts {
            self.opt.assert(&fact);
        }
    }

    /// Register `term` as a quantity to minimize. Multiple objectives may
    /// be registered; Z3 optimizes them lexicographically in registration
    /// order.
    pub fn minimize(&mut self, term: &Dynamic<'ctx>) {
        self.opt.minimize(term);
    }

    /// Register `term` as a quantity to maximize.
    pub fn maximize(&mut self, term: &Dynamic<'ctx>) {
        self.opt.maximize(term);
    }

    pub fn check(&mut self) -> SolverOutcome {
        let result = self.opt.check(&[]);
        match result {
            SatResult::Sat => SolverOutcome::Sat,
            SatResult::Unsat => SolverOutcome::Unsat,
            SatResult::Unknown => SolverOutcome::Unknown(None),
        }
    }

    /// The model witnessing the optimum found by the last `check()`. Only
    /// meaningful after a `Sat` outcome.
    pub fn model(&self) -> Option<z3::Model<'ctx>> {
        self.opt.get_model()
    }

    pub fn ctx(&self) -> &'ctx Context {
        self.ctx
    }
}
