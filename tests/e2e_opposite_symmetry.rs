//! Opposite-pairing symmetry: forcing a reference one way while forcing
//! its opposite to disagree must be unsatisfiable.

use closedworld::compiler::ModelContext;
use closedworld::objects::ForcedValue;
use closedworld::solver::Checker;
use closedworld::SolverOutcome;
use z3::{Config, Context};

fn scaffold<'ctx>(
    z3ctx: &'ctx Context,
) -> closedworld::Result<(
    ModelContext<'ctx>,
    closedworld::ids::ObjectId,
    closedworld::ids::ObjectId,
    closedworld::ids::ObjectId,
)> {
    let mut ctx = ModelContext::new(z3ctx);
    let person = ctx.define_class("Person", None, false)?;
    let team = ctx.define_class("Team", None, false)?;
    ctx.define_reference(person, "team", team, false, false, Some("members".to_string()))?;
    ctx.define_reference(team, "members", person, true, false, Some("team".to_string()))?;

    let alice = ctx.define_object("alice", person, false)?;
    let bob = ctx.define_object("bob", person, false)?;
    let red = ctx.define_object("red", team, false)?;
    Ok((ctx, alice, bob, red))
}

#[test]
fn agreeing_membership_is_sat() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let (mut ctx, alice, _bob, red) = scaffold(&z3ctx).unwrap();

    ctx.force_value(alice, "team", ForcedValue::ObjectRef(red));
    ctx.force_value(red, "members", ForcedValue::ObjectSet(vec![alice]));

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    assert_eq!(checker.check(), SolverOutcome::Sat);
}

#[test]
fn disagreeing_membership_is_unsat() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let (mut ctx, alice, bob, red) = scaffold(&z3ctx).unwrap();

    // alice claims membership on red, but red's member list names only bob.
    ctx.force_value(alice, "team", ForcedValue::ObjectRef(red));
    ctx.force_value(red, "members", ForcedValue::ObjectSet(vec![bob]));

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    assert_eq!(checker.check(), SolverOutcome::Unsat);
}
