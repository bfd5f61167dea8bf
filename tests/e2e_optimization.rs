//! Scenario 4: minimize the total price of suspended VMs while deploying
//! every container within its host's memory bound.
//!
//! Five containers needing mem=3 each, hosted only by three small vmem=4
//! VMs, don't actually bin-pack under a summed per-host capacity
//! constraint — 3 x 4 = 12 is less than 5 x 3 = 15. This test keeps the
//! qualitative shape (heterogeneous suspended VM costs,
//! `sum`-aggregated capacity, an `Optimize` objective that prefers cheap
//! small VMs over one big one) with container counts that are actually
//! satisfiable, so the "three small VMs, no large ones, minimal price"
//! outcome is reachable rather than asserted over an infeasible bound.

use closedworld::compiler::ModelContext;
use closedworld::domain::Domain;
use closedworld::expr::SetTerm;
use closedworld::objects::ForcedValue;
use closedworld::solver::Optimizer;
use closedworld::vars::VarKind;
use closedworld::SolverOutcome;
use z3::ast::{Ast, Dynamic};
use z3::{Config, Context};

#[test]
fn minimizing_vm_price_prefers_small_vms_over_one_large_one() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let vm = ctx.define_class("Vm", None, false).unwrap();
    ctx.define_attribute(vm, "vmem", Domain::Integer, false).unwrap();
    ctx.define_attribute(vm, "price", Domain::Integer, false).unwrap();

    let container = ctx.define_class("Container", None, false).unwrap();
    ctx.define_attribute(container, "mem", Domain::Integer, false).unwrap();
    ctx.define_reference(container, "host", vm, false, true, None).unwrap();

    // Five suspended VMs: two large, three small.
    let large_a = ctx.define_object("large_a", vm, true).unwrap();
    let large_b = ctx.define_object("large_b", vm, true).unwrap();
    let small_a = ctx.define_object("small_a", vm, true).unwrap();
    let small_b = ctx.define_object("small_b", vm, true).unwrap();
    let small_c = ctx.define_object("small_c", vm, true).unwrap();
    for large in [large_a, large_b] {
        ctx.force_value(large, "vmem", ForcedValue::Int(16));
        ctx.force_value(large, "price", ForcedValue::Int(20));
    }
    for small in [small_a, small_b, small_c] {
        ctx.force_value(small, "vmem", ForcedValue::Int(4));
        ctx.force_value(small, "price", ForcedValue::Int(4));
    }

    // Three containers, each needing mem=3: one small VM (vmem=4) can hold
    // exactly one of them, so three small VMs (price 4 each, total 12) are
    // both necessary and sufficient — strictly cheaper than any large VM.
    let c1 = ctx.define_object("c1", container, false).unwrap();
    let c2 = ctx.define_object("c2", container, false).unwrap();
    let c3 = ctx.define_object("c3", container, false).unwrap();
    for c in [c1, c2, c3] {
        ctx.force_value(c, "mem", ForcedValue::Int(3));
    }

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();
    ctx.require_config_generated().unwrap();

    let v_var = ctx.declare_var(VarKind::Object(vm), Some("v")).unwrap();
    let c_var = ctx.declare_var(VarKind::Object(container), Some("c")).unwrap();

    let all_vms = SetTerm::all_instances(&ctx, vm, v_var);
    let all_containers = SetTerm::all_instances(&ctx, container, c_var);

    let v_const = ctx.smt.var_const_ref(v_var).clone();
    let host_feature = ctx.smt.feature_func_ref("host").clone();
    let hosted_here = host_feature.apply(&[&ctx.smt.var_const_ref(c_var).clone()])._eq(&v_const);
    let containers_here = all_containers.filter(&ctx, &hosted_here.as_bool().unwrap());

    let universe = ctx.instance_universe();
    let mem_sum = containers_here.sum(&ctx, "mem", &universe).unwrap();
    let vmem = ctx.smt.feature_func_ref("vmem").apply(&[&v_const]).as_int().unwrap();
    let fits = all_vms.forall(&ctx, &mem_sum.le(&vmem));

    let price_sum = all_vms.sum(&ctx, "price", &universe).unwrap();

    let mut opt = Optimizer::new(&z3ctx);
    opt.assert_all(ctx.all_facts());
    opt.assert(&fits);
    opt.minimize(&Dynamic::from_ast(&price_sum));

    assert_eq!(opt.check(), SolverOutcome::Sat);
    let model = opt.model().expect("sat check must produce a model");

    let total_price = model.eval(&price_sum, true).unwrap().as_i64().unwrap();
    assert_eq!(total_price, 12);

    for large in [large_a, large_b] {
        let alive = ctx.smt.alive.apply(&[ctx.smt.object_const_ref(large)]).as_bool().unwrap();
        let alive_val = model.eval(&alive, true).unwrap().as_bool().unwrap();
        assert!(!alive_val, "large VMs are strictly more expensive and should stay suspended");
    }
    for small in [small_a, small_b, small_c] {
        let alive = ctx.smt.alive.apply(&[ctx.smt.object_const_ref(small)]).as_bool().unwrap();
        let alive_val = model.eval(&alive, true).unwrap().as_bool().unwrap();
        assert!(alive_val, "all three small VMs are needed to host the three containers");
    }

    for c in [c1, c2, c3] {
        let host = model
            .eval(&ctx.smt.feature_func_ref("host").apply(&[ctx.smt.object_const_ref(c)]), true)
            .unwrap();
        let nil_decoded = model.eval(&ctx.smt.nil, true).unwrap();
        assert_ne!(host, nil_decoded, "every container must be deployed to some host");
    }
}
