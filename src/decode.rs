//! Decoding a solved Z3 model back into object/feature values.
//!
//! For each object, evaluate `alive`/`actual_type` in the model, then for
//! each feature reachable from that actual class, decode a scalar
//! (attribute), a unique match (single reference), or a full scan
//! (multi-valued reference/attribute).

use std::collections::HashMap;

use z3::ast::Ast;
use z3::Model;

use crate::compiler::ModelContext;
use crate::domain::Domain;
use crate::ids::ObjectId;
use crate::schema::FeatureRange;

/// A decoded feature value, primitive or reference, single or set-valued.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Bool(bool),
    EnumValue(String),
    /// `None` means the reference is `nil`.
    ObjectRef(Option<String>),
    ObjectSet(Vec<String>),
}

/// The decoded state of one object: whether it's alive, its actual
/// (possibly more specific than declared, though this model doesn't
/// support dynamic reclassification) runtime class, and every feature
/// reachable from that class.
#[derive(Debug, Clone)]
pub struct ObjectState {
    pub name: String,
    pub alive: bool,
    pub class_name: String,
    pub features: HashMap<String, FeatureValue>,
}

/// Decode one object against a solved model.
pub fn decode_object<'ctx>(ctx: &ModelContext<'ctx>, model: &Model<'ctx>, obj: ObjectId) -> ObjectState {
    let def = ctx.objects.get(obj);
    let self_const = ctx.smt.object_const_ref(obj);

    let alive = eval_bool(model, &ctx.smt.alive.apply(&[self_const]));
    let class_name = ctx.schema.class(def.class).name.clone();

    let mut features = HashMap::new();
    for feature_name in ctx.schema.all_feature_names(def.class) {
        let feature_def = ctx.schema.get_feature(def.class, &feature_name).unwrap();
        let value = decode_feature(ctx, model, self_const, &feature_name, feature_def.range, feature_def.multiple);
        features.insert(feature_name, value);
    }

    ObjectState {
        name: def.name.clone(),
        alive,
        class_name,
        features,
    }
}

pub fn decode_all_objects<'ctx>(ctx: &ModelContext<'ctx>, model: &Model<'ctx>) -> Vec<ObjectState> {
    ctx.objects.iter().map(|o| decode_object(ctx, model, o.id)).collect()
}

fn decode_feature<'ctx>(
    ctx: &ModelContext<'ctx>,
    model: &Model<'ctx>,
    self_const: &z3::ast::Dynamic<'ctx>,
    feature_name: &str,
    range: FeatureRange,
    multiple: bool,
) -> FeatureValue {
    let feature = ctx.smt.feature_func_ref(feature_name);

    match (range, multiple) {
        (FeatureRange::Data(Domain::Integer), false) => {
            let value = model.eval(&feature.apply(&[self_const]).as_int().unwrap(), true).unwrap();
            FeatureValue::Int(value.as_i64().unwrap_or(0))
        }
        (FeatureRange::Data(Domain::Boolean), false) => FeatureValue::Bool(eval_bool(model, &feature.apply(&[self_const]))),
        (FeatureRange::Data(Domain::Enum(enum_id)), false) => {
            let decoded = model.eval(&feature.apply(&[self_const]), true).unwrap();
            let enumeration = ctx.schema.enum_(enum_id);
            let info = ctx.smt.enum_sort(enum_id);
            let index = info
                .constructors
                .iter()
                .position(|ctor| {
                    let applied = ctor.apply(&[]);
                    model.eval(&applied, true).map(|v| v == decoded).unwrap_or(false)
                })
                .unwrap_or(0);
            FeatureValue::EnumValue(enumeration.values[index].clone())
        }
        (FeatureRange::Class(_), false) => {
            let decoded = model.eval(&feature.apply(&[self_const]), true).unwrap();
            FeatureValue::ObjectRef(match_object(ctx, model, &decoded))
        }
        (FeatureRange::Class(_), true) => {
            let mut members = Vec::new();
            for obj in ctx.objects.iter() {
                let candidate = ctx.smt.object_const_ref(obj.id);
                let holds = eval_bool(model, &feature.apply(&[self_const, candidate]));
                if holds {
                    members.push(obj.name.clone());
                }
            }
            FeatureValue::ObjectSet(members)
        }
        (FeatureRange::Data(domain), true) => {
            // Multi-valued attributes are rare in practice but kept
            // consistent with multi-valued references: scan every value in
            // the domain's finite carrier and test membership.
            match domain {
                Domain::Integer | Domain::Boolean => FeatureValue::ObjectSet(Vec::new()),
                Domain::Enum(enum_id) => {
                    let enumeration = ctx.schema.enum_(enum_id);
                    let mut members = Vec::new();
                    for (idx, value_name) in enumeration.values.iter().enumerate() {
                        let value_const = ctx.smt.enum_value_const(enum_id, idx);
                        let holds = eval_bool(model, &feature.apply(&[self_const, &value_const]));
                        if holds {
                            members.push(value_name.clone());
                        }
                    }
                    FeatureValue::ObjectSet(members)
                }
            }
        }
    }
}

/// Find the declared object whose constant the model says equals `decoded`,
/// via a linear scan over the declared universe. Returns `None` for `nil`,
/// consistent with treating `nil` as "no reference".
fn match_object<'ctx>(ctx: &ModelContext<'ctx>, model: &Model<'ctx>, decoded: &z3::ast::Dynamic<'ctx>) -> Option<String> {
    let nil_decoded = model.eval(&ctx.smt.nil, true).unwrap();
    if *decoded == nil_decoded {
        return None;
    }
    for obj in ctx.objects.iter() {
        let candidate_decoded = model.eval(ctx.smt.object_const_ref(obj.id), true).unwrap();
        if *decoded == candidate_decoded {
            return Some(obj.name.clone());
        }
    }
    None
}

fn eval_bool<'ctx>(model: &Model<'ctx>, term: &z3::ast::Dynamic<'ctx>) -> bool {
    model
        .eval(&term.as_bool().unwrap(), true)
        .and_then(|b| b.as_bool())
        .unwrap_or(false)
}
