//! Scheduling feasibility: an assignment that overcommits a node's
//! capacity must be unsatisfiable once the capacity invariant is
//! asserted, and satisfiable once demand is within bounds.

use closedworld::compiler::ModelContext;
use closedworld::domain::Domain;
use closedworld::expr::SetTerm;
use closedworld::objects::ForcedValue;
use closedworld::solver::Checker;
use closedworld::vars::VarKind;
use closedworld::SolverOutcome;
use z3::ast::Ast;
use z3::{Config, Context};

fn capacity_holds<'ctx>(ctx: &ModelContext<'ctx>, node: closedworld::ids::ClassId, service: closedworld::ids::ClassId) -> z3::ast::Bool<'ctx> {
    let n_var = ctx
        .vars
        .by_name("n")
        .expect("n declared by caller before capacity_holds runs");
    let s_var = ctx
        .vars
        .by_name("s")
        .expect("s declared by caller before capacity_holds runs");

    let all_nodes = SetTerm::all_instances(ctx, node, n_var);
    let all_services = SetTerm::all_instances(ctx, service, s_var);

    let n_const = ctx.smt.var_const_ref(n_var).clone();
    let node_feature = ctx.smt.feature_func_ref("node").clone();
    let assigned_here = node_feature.apply(&[&ctx.smt.var_const_ref(s_var).clone()])._eq(&n_const);
    let services_here = all_services.filter(ctx, &assigned_here.as_bool().unwrap());

    let universe = ctx.instance_universe();
    let demand_sum = services_here.sum(ctx, "demand", &universe).unwrap();
    let capacity = ctx.smt.feature_func_ref("capacity").apply(&[&n_const]).as_int().unwrap();

    all_nodes.forall(ctx, &demand_sum.le(&capacity))
}

fn scaffold<'ctx>(z3ctx: &'ctx Context) -> closedworld::Result<(ModelContext<'ctx>, closedworld::ids::ClassId, closedworld::ids::ClassId, closedworld::ids::ObjectId)> {
    let mut ctx = ModelContext::new(z3ctx);
    let node = ctx.define_class("Node", None, false)?;
    ctx.define_attribute(node, "capacity", Domain::Integer, false)?;
    let service = ctx.define_class("Service", None, false)?;
    ctx.define_attribute(service, "demand", Domain::Integer, false)?;
    ctx.define_reference(service, "node", node, false, true, None)?;

    let node_a = ctx.define_object("node_a", node, false)?;
    ctx.force_value(node_a, "capacity", ForcedValue::Int(4));

    ctx.declare_var(VarKind::Object(node), Some("n"))?;
    ctx.declare_var(VarKind::Object(service), Some("s"))?;

    Ok((ctx, node, service, node_a))
}

#[test]
fn overcommitted_node_is_unsat() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let (mut ctx, node, service, node_a) = scaffold(&z3ctx).unwrap();

    let web = ctx.define_object("web", service, false).unwrap();
    let batch = ctx.define_object("batch", service, false).unwrap();
    ctx.force_value(web, "demand", ForcedValue::Int(3));
    ctx.force_value(batch, "demand", ForcedValue::Int(3));
    ctx.force_value(web, "node", ForcedValue::ObjectRef(node_a));
    ctx.force_value(batch, "node", ForcedValue::ObjectRef(node_a));

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let fits = capacity_holds(&ctx, node, service);

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    checker.assert(&fits);

    assert_eq!(checker.check(), SolverOutcome::Unsat);
}

#[test]
fn balanced_assignment_is_sat() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let (mut ctx, node, service, node_a) = scaffold(&z3ctx).unwrap();

    let web = ctx.define_object("web", service, false).unwrap();
    let batch = ctx.define_object("batch", service, false).unwrap();
    ctx.force_value(web, "demand", ForcedValue::Int(2));
    ctx.force_value(batch, "demand", ForcedValue::Int(1));
    ctx.force_value(web, "node", ForcedValue::ObjectRef(node_a));
    ctx.force_value(batch, "node", ForcedValue::ObjectRef(node_a));

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let fits = capacity_holds(&ctx, node, service);

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    checker.assert(&fits);

    assert_eq!(checker.check(), SolverOutcome::Sat);
}
