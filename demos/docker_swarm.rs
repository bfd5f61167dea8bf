//! A minimal scheduler feasibility check: can every service be assigned
//! to a node without exceeding that node's CPU capacity?
//!
//! Models the aggregation half of the expression algebra (`sum` over a
//! joined set) rather than a true optimizer; see `solver::Optimizer` for
//! the objective-directed search.
//!
//! Run with `cargo run --bin docker-swarm`.

use closedworld::compiler::ModelContext;
use closedworld::domain::Domain;
use closedworld::expr::SetTerm;
use closedworld::objects::ForcedValue;
use closedworld::solver::Checker;
use closedworld::vars::VarKind;
use z3::ast::Ast;
use z3::{Config, Context};

fn main() -> closedworld::Result<()> {
    env_logger::init();

    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let node = ctx.define_class("Node", None, false)?;
    ctx.define_attribute(node, "capacity", Domain::Integer, false)?;

    let service = ctx.define_class("Service", None, false)?;
    ctx.define_attribute(service, "demand", Domain::Integer, false)?;
    ctx.define_reference(service, "node", node, false, true, None)?;

    let node_a = ctx.define_object("node_a", node, false)?;
    let node_b = ctx.define_object("node_b", node, false)?;
    ctx.force_value(node_a, "capacity", ForcedValue::Int(4));
    ctx.force_value(node_b, "capacity", ForcedValue::Int(4));

    let web = ctx.define_object("web", service, false)?;
    let worker = ctx.define_object("worker", service, false)?;
    let batch = ctx.define_object("batch", service, false)?;
    ctx.force_value(web, "demand", ForcedValue::Int(2));
    ctx.force_value(worker, "demand", ForcedValue::Int(2));
    ctx.force_value(batch, "demand", ForcedValue::Int(3));
    ctx.force_value(web, "node", ForcedValue::ObjectRef(node_a));
    ctx.force_value(worker, "node", ForcedValue::ObjectRef(node_a));
    ctx.force_value(batch, "node", ForcedValue::ObjectRef(node_b));

    ctx.generate_meta_constraints()?;
    ctx.generate_config_constraints()?;
    ctx.require_config_generated()?;

    // For each node, the services pointed at it must not demand more than
    // its capacity: forall n: Node. sum(s in Service | s.node = n, s.demand) <= n.capacity
    let n_var = ctx.declare_var(VarKind::Object(node), Some("n"))?;
    let s_var = ctx.declare_var(VarKind::Object(service), Some("s"))?;

    let all_nodes = SetTerm::all_instances(&ctx, node, n_var);
    let all_services = SetTerm::all_instances(&ctx, service, s_var);

    let n_const = ctx.smt.var_const_ref(n_var).clone();
    let node_feature = ctx.smt.feature_func_ref("node").clone();
    let assigned_here = node_feature.apply(&[&ctx.smt.var_const_ref(s_var).clone()])._eq(&n_const);
    let services_here = all_services.filter(&ctx, &assigned_here.as_bool().unwrap());

    let universe = ctx.instance_universe();
    let demand_sum = services_here.sum(&ctx, "demand", &universe)?;
    let capacity = ctx.smt.feature_func_ref("capacity").apply(&[&n_const]).as_int().unwrap();
    let within_capacity = demand_sum.le(&capacity);

    let fits = all_nodes.forall(&ctx, &within_capacity);

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    checker.assert(&fits);

    match checker.check() {
        closedworld::SolverOutcome::Sat => println!("assignment fits within capacity"),
        closedworld::SolverOutcome::Unsat => println!("assignment overcommits at least one node"),
        closedworld::SolverOutcome::Unknown(reason) => println!("solver gave up: {reason:?}"),
    }

    Ok(())
}
