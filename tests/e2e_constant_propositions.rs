//! Ground propositions with no free variables: forcing a boolean
//! attribute pins it down exactly, and asserting its negation alongside
//! the generated facts is unsatisfiable.

use closedworld::compiler::ModelContext;
use closedworld::domain::Domain;
use closedworld::expr::PartialExpr;
use closedworld::objects::ForcedValue;
use closedworld::solver::Checker;
use closedworld::SolverOutcome;
use z3::ast::Ast;
use z3::{Config, Context};

#[test]
fn forced_boolean_attribute_contradicts_its_negation() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let switch = ctx.define_class("Switch", None, false).unwrap();
    ctx.define_attribute(switch, "on", Domain::Boolean, false).unwrap();
    let s1 = ctx.define_object("s1", switch, false).unwrap();
    ctx.force_value(s1, "on", ForcedValue::Bool(true));

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let on_feature = ctx.smt.feature_func_ref("on").apply(&[ctx.smt.object_const_ref(s1)]).as_bool().unwrap();

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    assert_eq!(checker.check(), SolverOutcome::Sat);

    {
        let mut scope = checker.scope();
        scope.assert(&on_feature.not());
        assert_eq!(scope.check(), SolverOutcome::Unsat);
    }

    // Popped back out: the contradiction doesn't leak past the scope.
    assert_eq!(checker.check(), SolverOutcome::Sat);
}

#[test]
fn a_bare_ground_contradiction_is_unsat_with_no_model_facts_at_all() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut checker = Checker::new(&z3ctx);
    checker.assert(&z3::ast::Bool::from_bool(&z3ctx, false));
    assert_eq!(checker.check(), SolverOutcome::Unsat);
}

#[test]
fn sametype_and_undefined_hold_as_constant_propositions() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let device = ctx.define_class("Device", None, true).unwrap();
    let lamp = ctx.define_class("Lamp", Some(device), false).unwrap();
    let fan = ctx.define_class("Fan", Some(device), false).unwrap();
    ctx.define_reference(lamp, "backup", device, false, false, None).unwrap();

    let l1 = ctx.define_object("l1", lamp, false).unwrap();
    let l2 = ctx.define_object("l2", lamp, false).unwrap();
    ctx.define_object("f1", fan, false).unwrap();

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());

    // l1 and l2 are both Lamp instances, so l1.sametype(l2) is a constant truth.
    let l1_expr = PartialExpr::ground(ctx.smt.object_const_ref(l1).clone());
    let l2_const = ctx.smt.object_const_ref(l2).clone();
    let same = l1_expr.sametype(&ctx, &l2_const).unwrap();
    {
        let mut scope = checker.scope();
        scope.assert(&same.not());
        assert_eq!(scope.check(), SolverOutcome::Unsat);
    }

    // l1's optional "backup" reference was never forced, so it reads as
    // nil — "undefined" — in every model.
    let backup_of_l1 = PartialExpr::ground(
        ctx.smt.feature_func_ref("backup").apply(&[ctx.smt.object_const_ref(l1)]),
    );
    let is_undefined = backup_of_l1.undefined(&ctx).unwrap();
    {
        let mut scope = checker.scope();
        scope.assert(&is_undefined.not());
        assert_eq!(scope.check(), SolverOutcome::Unsat);
    }
}
