//! An enum-valued attribute round-trips through forcing and decoding, and
//! a reference outside the enum's domain is caught as a schema error
//! rather than silently accepted.

use closedworld::compiler::ModelContext;
use closedworld::decode::FeatureValue;
use closedworld::domain::Domain;
use closedworld::error::{ModelError, SchemaError};
use closedworld::objects::ForcedValue;
use closedworld::solver::Checker;
use z3::{Config, Context};

#[test]
fn forced_enum_value_decodes_back_unchanged() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let status = ctx.define_enum("Status", vec!["Pending".to_string(), "Active".to_string(), "Done".to_string()]).unwrap();
    let task = ctx.define_class("Task", None, false).unwrap();
    ctx.define_attribute(task, "status", Domain::Enum(status), false).unwrap();

    let t1 = ctx.define_object("t1", task, false).unwrap();
    ctx.force_value(t1, "status", ForcedValue::EnumValue("Active".to_string()));

    ctx.generate_meta_constraints().unwrap();
    ctx.generate_config_constraints().unwrap();

    let mut checker = Checker::new(&z3ctx);
    checker.assert_all(ctx.all_facts());
    assert!(checker.check().is_sat());

    let model = checker.model().expect("sat check produces a model");
    let decoded = closedworld::decode::decode_object(&ctx, &model, t1);
    assert_eq!(decoded.features.get("status"), Some(&FeatureValue::EnumValue("Active".to_string())));
}

#[test]
fn unknown_enum_value_is_rejected_at_config_generation() {
    let cfg = Config::new();
    let z3ctx = Context::new(&cfg);
    let mut ctx = ModelContext::new(&z3ctx);

    let status = ctx.define_enum("Status", vec!["Pending".to_string(), "Active".to_string()]).unwrap();
    let task = ctx.define_class("Task", None, false).unwrap();
    ctx.define_attribute(task, "status", Domain::Enum(status), false).unwrap();
    let t1 = ctx.define_object("t1", task, false).unwrap();
    ctx.force_value(t1, "status", ForcedValue::EnumValue("Cancelled".to_string()));

    ctx.generate_meta_constraints().unwrap();
    let err = ctx.generate_config_constraints().unwrap_err();
    assert!(matches!(err, ModelError::Schema(SchemaError::UnknownEnumValue { .. })));
}
