//! Axiomatization of the closed-world type universe: the `Type`/`Inst`
//! sorts, subtype closure, instance membership, and aliveness — the
//! schema-level "meta facts" and object-level "config facts".
//!
//! Both sorts are finite and closed, so membership is asserted one fact
//! per declared class/object pair rather than by trying to axiomatize
//! `is_subtype` recursively.

use z3::ast::{Ast, Bool};

use crate::compiler::ModelContext;
use crate::objects::ForcedValue;

/// Facts that only depend on the class/enum graph: distinctness of type
/// constants, the `super`/`is_subtype`/`is_abstract` truth tables, and the
/// universal link between `is_instance` and `is_subtype`.
///
/// Regenerate whenever a class or enum is declared.
pub fn meta_facts<'ctx>(ctx: &ModelContext<'ctx>) -> Vec<Bool<'ctx>> {
    let smt = &ctx.smt;
    let mut facts = Vec::new();

    let type_consts = smt.all_type_consts(&ctx.class_order);
    let type_refs: Vec<&z3::ast::Dynamic<'ctx>> = type_consts.iter().collect();
    facts.push(z3::ast::Dynamic::distinct(smt.ctx, &type_refs));

    for &class in &ctx.class_order {
        let class_def = ctx.schema.class(class);
        let self_const = smt.class_const_ref(class).clone();

        let super_const = match class_def.supertype {
            Some(sup) => smt.class_const_ref(sup).clone(),
            None => smt.nil_type.clone(),
        };
        facts.push(smt.super_type.apply(&[&self_const])._eq(&super_const));

        let abstract_claim = smt.is_abstract.apply(&[&self_const]).as_bool().unwrap();
        facts.push(if class_def.abstract_ { abstract_claim } else { abstract_claim.not() });

        for &other in &ctx.class_order {
            let other_const = smt.class_const_ref(other).clone();
            let related = ctx.schema.is_subtype_decl(class, other);
            let claim = smt
                .is_subtype
                .apply(&[&self_const, &other_const])
                .as_bool()
                .unwrap();
            facts.push(if related { claim } else { claim.not() });
        }
        // NilType is never a supertype relation target for a real class.
        let claim_nil = smt
            .is_subtype
            .apply(&[&self_const, &smt.nil_type])
            .as_bool()
            .unwrap();
        facts.push(claim_nil.not());
    }

    facts.push(
        smt.is_subtype
            .apply(&[&smt.nil_type, &smt.nil_type])
            .as_bool()
            .unwrap(),
    );
    facts.push(smt.is_abstract.apply(&[&smt.nil_type]).as_bool().unwrap().not());

    // `nil` is never alive and its actual type is always `NilType`.
    facts.push(smt.actual_type.apply(&[&smt.nil])._eq(&smt.nil_type));
    facts.push(smt.alive.apply(&[&smt.nil]).as_bool().unwrap().not());

    // is_instance(x, t) <-> is_subtype(actual_type(x), t), for every x:Inst, t:Type.
    let x = smt.fresh_const(&smt.inst_sort, "meta_x");
    let t = smt.fresh_const(&smt.type_sort, "meta_t");
    let lhs = smt.is_instance.apply(&[&x, &t]).as_bool().unwrap();
    let rhs = smt
        .is_subtype
        .apply(&[&smt.actual_type.apply(&[&x]), &t])
        .as_bool()
        .unwrap();
    facts.push(z3::ast::forall_const(smt.ctx, &[&x, &t], &[], &lhs.iff(&rhs)));

    for &class in &ctx.class_order {
        let class_def = ctx.schema.class(class);
        let mut names: Vec<&String> = class_def.references.keys().collect();
        names.sort();
        for name in names {
            let feature_def = &class_def.references[name];
            let target = match feature_def.range {
                crate::schema::FeatureRange::Class(t) => t,
                crate::schema::FeatureRange::Data(_) => unreachable!("references always target a class"),
            };

            facts.push(feature_well_typedness_axiom(
                ctx,
                class,
                name,
                feature_def.multiple,
                feature_def.mandatory,
                target,
            ));

            if let Some(opposite_name) = &feature_def.opposite {
                // Validated to exist and be a reference at `define_reference` time.
                let opposite_def = ctx.schema.get_feature(target, opposite_name).unwrap();
                facts.push(opposite_symmetry_axiom(
                    ctx,
                    class,
                    name,
                    feature_def.multiple,
                    target,
                    opposite_name,
                    opposite_def.multiple,
                ));
            }
        }
    }

    facts
}

/// Per-feature well-typedness, emitted once per class `C` that owns
/// reference `f: C -> T`:
///
/// - single-valued, mandatory: every live `x:C` has `f(x)` live and an
///   instance of `T`.
/// - single-valued, optional: every live `x:C` has `f(x) = nil` or live
///   and an instance of `T`.
/// - multi-valued: every `y` related to a live `x:C` is itself live and an
///   instance of `T` — `nil` and other dead instances can never be members.
fn feature_well_typedness_axiom<'ctx>(
    ctx: &ModelContext<'ctx>,
    owner: crate::ids::ClassId,
    feature_name: &str,
    multiple: bool,
    mandatory: bool,
    target: crate::ids::ClassId,
) -> Bool<'ctx> {
    let smt = &ctx.smt;
    let owner_const = smt.class_const_ref(owner).clone();
    let target_const = smt.class_const_ref(target).clone();
    let feature = smt.feature_func_ref(feature_name).clone();

    let x = smt.fresh_const(&smt.inst_sort, "wt_x");
    let x_alive = smt.alive.apply(&[&x]).as_bool().unwrap();
    let x_is_owner = smt.is_instance.apply(&[&x, &owner_const]).as_bool().unwrap();
    let x_in_scope = Bool::and(smt.ctx, &[&x_alive, &x_is_owner]);

    if multiple {
        let y = smt.fresh_const(&smt.inst_sort, "wt_y");
        let y_alive = smt.alive.apply(&[&y]).as_bool().unwrap();
        let y_is_target = smt.is_instance.apply(&[&y, &target_const]).as_bool().unwrap();
        // A member must be alive AND of the declared target type or a
        // subtype — not merely "not of the wrong type", which would leave
        // `nil` and other dead instances unconstrained as potential
        // members.
        let y_not_well_typed = Bool::and(smt.ctx, &[&y_alive, &y_is_target]).not();
        let member = feature.apply(&[&x, &y]).as_bool().unwrap();
        let culprit = Bool::and(smt.ctx, &[&x_in_scope, &y_not_well_typed]);
        z3::ast::forall_const(smt.ctx, &[&x, &y], &[], &culprit.implies(&member.not()))
    } else {
        let image = feature.apply(&[&x]);
        let well_typed = Bool::and(
            smt.ctx,
            &[
                &smt.alive.apply(&[&image]).as_bool().unwrap(),
                &smt.is_instance.apply(&[&image, &target_const]).as_bool().unwrap(),
            ],
        );
        let body = if mandatory {
            well_typed
        } else {
            let is_nil = image._eq(&smt.nil);
            Bool::or(smt.ctx, &[&is_nil, &well_typed])
        };
        z3::ast::forall_const(smt.ctx, &[&x], &[], &x_in_scope.implies(&body))
    }
}

/// `forall a: C, b: T. membership(R, a, b) <-> membership(opposite(R), b, a)`,
/// asserted as a standing axiom rather than maintained imperatively on
/// assignment. Scoped to `a`'s owning class and `b`'s target class: feature
/// names are global, so an unscoped `forall a b: Inst` would force every
/// same-named reference pair in the universe into one relation, even across
/// classes that happen to reuse the name for an unrelated opposite.
fn opposite_symmetry_axiom<'ctx>(
    ctx: &ModelContext<'ctx>,
    owner: crate::ids::ClassId,
    reference: &str,
    reference_multiple: bool,
    target: crate::ids::ClassId,
    opposite: &str,
    opposite_multiple: bool,
) -> Bool<'ctx> {
    let smt = &ctx.smt;
    let owner_const = smt.class_const_ref(owner).clone();
    let target_const = smt.class_const_ref(target).clone();
    let a = smt.fresh_const(&smt.inst_sort, "opp_a");
    let b = smt.fresh_const(&smt.inst_sort, "opp_b");

    let a_in_scope = smt.is_instance.apply(&[&a, &owner_const]).as_bool().unwrap();
    let b_in_scope = smt.is_instance.apply(&[&b, &target_const]).as_bool().unwrap();
    let in_scope = Bool::and(smt.ctx, &[&a_in_scope, &b_in_scope]);

    let r = smt.feature_func_ref(reference).clone();
    let o = smt.feature_func_ref(opposite).clone();

    let forward = membership(&r, reference_multiple, &a, &b);
    let backward = membership(&o, opposite_multiple, &b, &a);

    z3::ast::forall_const(smt.ctx, &[&a, &b], &[], &in_scope.implies(&forward.iff(&backward)))
}

fn membership<'ctx>(feature: &z3::FuncDecl<'ctx>, multiple: bool, from: &z3::ast::Dynamic<'ctx>, to: &z3::ast::Dynamic<'ctx>) -> Bool<'ctx> {
    if multiple {
        feature.apply(&[from, to]).as_bool().unwrap()
    } else {
        feature.apply(&[from])._eq(to)
    }
}

/// Facts that depend on the declared objects: distinctness of instance
/// constants, each object's `actual_type`, `alive`, and whatever values
/// its definition forces.
///
/// Regenerate whenever an object is declared or a value is forced.
pub fn config_facts<'ctx>(ctx: &ModelContext<'ctx>) -> crate::error::Result<Vec<Bool<'ctx>>> {
    let smt = &ctx.smt;
    let mut facts = Vec::new();

    let inst_consts = smt.all_inst_consts(&ctx.object_order);
    let inst_refs: Vec<&z3::ast::Dynamic<'ctx>> = inst_consts.iter().collect();
    facts.push(z3::ast::Dynamic::distinct(smt.ctx, &inst_refs));

    for &obj_id in &ctx.object_order {
        let obj = ctx.objects.get(obj_id);
        let self_const = smt.object_const_ref(obj_id).clone();
        let class_const = smt.class_const_ref(obj.class).clone();

        facts.push(smt.actual_type.apply(&[&self_const])._eq(&class_const));

        let alive_claim = smt.alive.apply(&[&self_const]).as_bool().unwrap();
        facts.push(if obj.suspended { alive_claim.not() } else { alive_claim });

        for (feature_name, value) in &obj.forced {
            facts.push(forced_value_fact(ctx, &self_const, feature_name, value)?);
        }
    }

    Ok(facts)
}

fn forced_value_fact<'ctx>(
    ctx: &ModelContext<'ctx>,
    self_const: &z3::ast::Dynamic<'ctx>,
    feature_name: &str,
    value: &ForcedValue,
) -> crate::error::Result<Bool<'ctx>> {
    let smt = &ctx.smt;
    let feature = smt.feature_func_ref(feature_name).clone();

    Ok(match value {
        ForcedValue::Int(n) => feature
            .apply(&[self_const])
            .as_int()
            .unwrap()
            ._eq(&z3::ast::Int::from_i64(smt.ctx, *n)),
        ForcedValue::Bool(b) => {
            let claim = feature.apply(&[self_const]).as_bool().unwrap();
            if *b {
                claim
            } else {
                claim.not()
            }
        }
        ForcedValue::EnumValue(name) => {
            let enum_id = find_enum_for_feature(ctx, feature_name)?;
            let enumeration = ctx.schema.enum_(enum_id);
            let index = enumeration
                .index_of(name)
                .ok_or_else(|| crate::error::SchemaError::UnknownEnumValue {
                    enum_name: enumeration.name.clone(),
                    value: name.clone(),
                })?;
            let value_const = smt.enum_value_const(enum_id, index);
            feature.apply(&[self_const])._eq(&value_const)
        }
        ForcedValue::ObjectRef(target) => {
            // "equal when alive": a bare equality fact, no aliveness guard.
            // Whether `target` itself ends up alive is then governed by the
            // ordinary well-typedness axioms, not by a special case here.
            let target_const = smt.object_const_ref(*target).clone();
            feature.apply(&[self_const])._eq(&target_const)
        }
        ForcedValue::ObjectSet(members) => {
            let member_consts: Vec<z3::ast::Dynamic<'ctx>> =
                members.iter().map(|m| smt.object_const_ref(*m).clone()).collect();
            let universe = smt.all_inst_consts(&ctx.object_order);
            let clauses: Vec<Bool<'ctx>> = universe
                .iter()
                .map(|elem| {
                    let membership = feature.apply(&[self_const, elem]).as_bool().unwrap();
                    if member_consts.iter().any(|m| m == elem) {
                        membership
                    } else {
                        membership.not()
                    }
                })
                .collect();
            let refs: Vec<&Bool<'ctx>> = clauses.iter().collect();
            Bool::and(smt.ctx, &refs)
        }
    })
}

fn find_enum_for_feature(ctx: &ModelContext<'_>, feature_name: &str) -> crate::error::Result<crate::ids::EnumId> {
    for class in ctx.schema.classes() {
        if let Some(def) = class.attributes.get(feature_name) {
            if let crate::schema::FeatureRange::Data(crate::domain::Domain::Enum(id)) = def.range {
                return Ok(id);
            }
        }
    }
    Err(crate::error::BindingError::UnknownFeature {
        class: "<any>".to_string(),
        feature: feature_name.to_string(),
    }
    .into())
}
