//! Scenario 3: three facts that individually fit the schema but jointly
//! contradict each other — a service whose label-based placement
//! constraint names a node with the right label, while a direct placement
//! constraint names a *different* node that lacks that label. The overall
//! check must be `unsat`, and the unsat core must name exactly the three
//! conflicting facts, not some superset including the schema's ambient
//! meta/config facts.

use closedworld::compiler::ModelContext;
use closedworld::domain::Domain;
use closedworld::solver::Checker;
use closedworld::SolverOutcome;
use std::collections::HashSet;
use z3::ast::Ast;
use z3::{Config, Context};

#[test]
fn label_and_direct_placement_conflict_names_exactly_the_three_culprits() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let label = ctx.define_enum("Label", vec!["Ssd".to_string(), "Disk".to_string()]).unwrap();
    let node = ctx.define_class("Node", None, false).unwrap();
    ctx.define_attribute(node, "label", Domain::Enum(label), true).unwrap();
    let service = ctx.define_class("Service", None, false).unwrap();
    ctx.define_reference(service, "deploy", node, false, false, None).unwrap();

    let vm1 = ctx.define_object("vm1", node, false).unwrap();
    let vm2 = ctx.define_object("vm2", node, false).unwrap();
    let db = ctx.define_object("db", service, false).unwrap();

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let label_feature = ctx.smt.feature_func_ref("label").clone();
    let deploy_feature = ctx.smt.feature_func_ref("deploy").clone();
    let ssd = ctx.smt.enum_value_const(label, 0);

    let deploy_of_db = deploy_feature.apply(&[ctx.smt.object_const_ref(db)]);
    let vm2_const = ctx.smt.object_const_ref(vm2).clone();

    // db.nodeLabel ∋ lb_ssd: whatever db deploys to has the Ssd label.
    let db_node_label_ssd = label_feature.apply(&[&deploy_of_db, &ssd]).as_bool().unwrap();
    // db.nodeDirect = vm2: db is pinned directly to vm2.
    let db_node_direct_vm2 = deploy_of_db._eq(&vm2_const);
    // vm2.label ∌ lb_ssd: vm2 itself was never given the Ssd label.
    let vm2_label_excludes_ssd = label_feature
        .apply(&[&vm2_const, &ssd])
        .as_bool()
        .unwrap()
        .not();

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    checker.assert_tracked("db.nodeLabel_contains_ssd", &db_node_label_ssd);
    checker.assert_tracked("db.nodeDirect_eq_vm2", &db_node_direct_vm2);
    checker.assert_tracked("vm2.label_excludes_ssd", &vm2_label_excludes_ssd);

    assert_eq!(checker.check(), SolverOutcome::Unsat);

    let core: HashSet<String> = checker.unsat_core().unwrap().into_iter().collect();
    let expected: HashSet<String> = [
        "db.nodeLabel_contains_ssd".to_string(),
        "db.nodeDirect_eq_vm2".to_string(),
        "vm2.label_excludes_ssd".to_string(),
    ]
    .into_iter()
    .collect();
    assert_eq!(core, expected, "unsat core must name exactly the three conflicting facts");

    // vm1 is untouched by any of this — the contradiction is independent
    // of it, confirming the core isn't accidentally dragging in unrelated
    // declared objects.
    let _ = vm1;
}
