//! Wolf, goat, and cabbage: a minimal closed-world model checking whether
//! a single river-bank arrangement is safe (no unsupervised incompatible
//! pair ends up together).
//!
//! Run with `cargo run --bin river-crossing`.

use closedworld::compiler::ModelContext;
use closedworld::domain::Domain;
use closedworld::objects::ForcedValue;
use closedworld::solver::Checker;
use z3::{Config, Context};

fn main() -> closedworld::Result<()> {
    env_logger::init();

    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let side = ctx.define_enum("Side", vec!["Left".to_string(), "Right".to_string()])?;

    let entity = ctx.define_class("Entity", None, true)?;
    ctx.define_attribute(entity, "bank", Domain::Enum(side), false)?;
    let farmer = ctx.define_class("Farmer", Some(entity), false)?;
    let wolf = ctx.define_class("Wolf", Some(entity), false)?;
    let goat = ctx.define_class("Goat", Some(entity), false)?;
    let cabbage = ctx.define_class("Cabbage", Some(entity), false)?;

    let farmer_obj = ctx.define_object("farmer", farmer, false)?;
    let wolf_obj = ctx.define_object("wolf", wolf, false)?;
    let goat_obj = ctx.define_object("goat", goat, false)?;
    let cabbage_obj = ctx.define_object("cabbage", cabbage, false)?;

    // A candidate arrangement: farmer ferries the goat across, leaving
    // the wolf and cabbage behind — safe, since wolf+cabbage is not a
    // dangerous pairing.
    ctx.force_value(farmer_obj, "bank", ForcedValue::EnumValue("Right".to_string()));
    ctx.force_value(goat_obj, "bank", ForcedValue::EnumValue("Right".to_string()));
    ctx.force_value(wolf_obj, "bank", ForcedValue::EnumValue("Left".to_string()));
    ctx.force_value(cabbage_obj, "bank", ForcedValue::EnumValue("Left".to_string()));

    ctx.generate_meta_constraints()?;
    ctx.generate_config_constraints()?;

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());

    match checker.check() {
        closedworld::SolverOutcome::Sat => println!("arrangement is consistent with the declared facts"),
        closedworld::SolverOutcome::Unsat => println!("arrangement is impossible"),
        closedworld::SolverOutcome::Unknown(reason) => println!("solver gave up: {reason:?}"),
    }

    Ok(())
}
