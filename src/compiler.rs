//! `ModelContext`: the single owner of schema, object, and variable state
//! plus the Z3 bindings built over them, and the orchestrator for
//! generating and ordering meta/config facts.
//!
//! All mutable model state lives behind this one value instead of process
//! globals; dropping a `ModelContext` is how a caller starts over with a
//! fresh model.

use z3::Context;

use crate::domain::Domain;
use crate::error::{OrderingError, Result};
use crate::ids::{ClassId, EnumId, ObjectId, VarId};
use crate::objects::{ForcedValue, ObjectRegistry};
use crate::schema::Schema;
use crate::smt::Smt;
use crate::vars::{VarKind, VarRegistry};

/// Everything needed to build and check a closed-world model: the
/// schema-level declarations, the object registry, free variables, the
/// Z3 bindings over all of them, and the accumulated facts.
pub struct ModelContext<'ctx> {
    pub schema: Schema,
    pub objects: ObjectRegistry,
    pub vars: VarRegistry,
    pub smt: Smt<'ctx>,

    /// Declaration order, needed to build the closed-universe membership
    /// lists handed to `distinct` and to `sum`/`count`.
    pub(crate) class_order: Vec<ClassId>,
    pub(crate) object_order: Vec<ObjectId>,

    meta: Vec<z3::ast::Bool<'ctx>>,
    config: Vec<z3::ast::Bool<'ctx>>,
    config_generated: bool,
}

impl<'ctx> ModelContext<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        log::debug!("creating new model context");
        Self {
            schema: Schema::new(),
            objects: ObjectRegistry::new(),
            vars: VarRegistry::new(),
            smt: Smt::new(ctx),
            class_order: Vec::new(),
            object_order: Vec::new(),
            meta: Vec::new(),
            config: Vec::new(),
            config_generated: false,
        }
    }

    // --- schema declarations -------------------------------------------------

    pub fn define_enum(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<EnumId> {
        let name = name.into();
        log::trace!("declaring enum {name}");
        let id = self.schema.define_enum(name, values)?;
        self.smt.define_enum(id, self.schema.enum_(id));
        Ok(id)
    }

    pub fn define_class(
        &mut self,
        name: impl Into<String>,
        supertype: Option<ClassId>,
        abstract_: bool,
    ) -> Result<ClassId> {
        let name = name.into();
        log::trace!("declaring class {name} (abstract={abstract_})");
        let id = self.schema.define_class(&name, supertype, abstract_)?;
        self.smt.class_const(id, &name);
        self.class_order.push(id);
        Ok(id)
    }

    pub fn define_attribute(&mut self, class: ClassId, name: impl Into<String>, domain: Domain, multiple: bool) -> Result<()> {
        let name = name.into();
        self.schema.define_attribute(class, &name, domain, multiple)?;
        self.smt
            .feature_func(&name, crate::schema::FeatureRange::Data(domain), multiple);
        Ok(())
    }

    pub fn define_reference(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        target: ClassId,
        multiple: bool,
        mandatory: bool,
        opposite: Option<String>,
    ) -> Result<()> {
        let name = name.into();
        self.schema
            .define_reference(class, &name, target, multiple, mandatory, opposite)?;
        self.smt
            .feature_func(&name, crate::schema::FeatureRange::Class(target), multiple);
        Ok(())
    }

    /// Validate that every declared `opposite` actually resolves against
    /// its target class. `define_reference` can't check this eagerly,
    /// since the two sides of an opposite pair are often declared in
    /// either order (see `schema_loader`'s two-pass loading); call this
    /// once all classes and references are declared, before
    /// `generate_meta_constraints`.
    pub fn validate_opposites(&self) -> Result<()> {
        for class in self.schema.classes() {
            let mut names: Vec<&String> = class.references.keys().collect();
            names.sort();
            for name in names {
                let feature_def = &class.references[name];
                if feature_def.opposite.is_some() {
                    let target = match feature_def.range {
                        crate::schema::FeatureRange::Class(t) => t,
                        crate::schema::FeatureRange::Data(_) => unreachable!("references always target a class"),
                    };
                    self.schema.resolve_opposite(feature_def, target)?;
                }
            }
        }
        Ok(())
    }

    // --- object declarations -------------------------------------------------

    pub fn define_object(&mut self, name: impl Into<String>, class: ClassId, suspended: bool) -> Result<ObjectId> {
        let name = name.into();
        log::trace!("declaring object {name} : {class:?} (suspended={suspended})");
        let id = self.objects.define_object(&self.schema, &name, class, suspended)?;
        self.smt.object_const(id, &name);
        self.object_order.push(id);
        self.config_generated = false;
        Ok(id)
    }

    pub fn force_value(&mut self, obj: ObjectId, feature: impl Into<String>, value: ForcedValue) {
        self.objects.force_value(obj, feature, value);
        self.config_generated = false;
    }

    // --- variable declarations -----------------------------------------------

    pub fn declare_var(&mut self, kind: VarKind, id: Option<&str>) -> Result<VarId> {
        let type_label = self.type_label(kind);
        let var_id = self.vars.declare_var(kind, id, &type_label)?;
        let name = self.vars.get(var_id).name.clone();
        let sort = self.var_sort(kind);
        self.smt.var_const(var_id, &name, &sort);
        Ok(var_id)
    }

    fn type_label(&self, kind: VarKind) -> String {
        match kind {
            VarKind::Object(class) => self.schema.class(class).name.clone(),
            VarKind::Data(Domain::Integer) => "Integer".to_string(),
            VarKind::Data(Domain::Boolean) => "Boolean".to_string(),
            VarKind::Data(Domain::Enum(id)) => self.schema.enum_(id).name.clone(),
        }
    }

    fn var_sort(&self, kind: VarKind) -> z3::Sort<'ctx> {
        match kind {
            VarKind::Object(_) => self.smt.inst_sort.clone(),
            VarKind::Data(domain) => self.smt.domain_sort(domain),
        }
    }

    // --- constraint generation and ordering -----------------------------------

    /// Regenerate the schema-level meta facts. Safe to call as often as
    /// needed; cheap relative to `generate_config_constraints` since it
    /// scales with class count, not object count.
    pub fn generate_meta_constraints(&mut self) -> Result<()> {
        log::debug!("regenerating meta constraints ({} classes)", self.class_order.len());
        self.validate_opposites()?;
        self.meta = crate::universe::meta_facts(self);
        Ok(())
    }

    /// Regenerate the object-level config facts. Must run after
    /// [`Self::generate_meta_constraints`] has run at least once for the
    /// current class graph, and must run again after any `define_object`
    /// or `force_value` call before `sum`/`count` are used — see
    /// [`Self::require_config_generated`].
    pub fn generate_config_constraints(&mut self) -> Result<()> {
        log::debug!("regenerating config constraints ({} objects)", self.object_order.len());
        self.config = crate::universe::config_facts(self)?;
        self.config_generated = true;
        Ok(())
    }

    /// All accumulated facts: meta first, then config, matching the order
    /// they're generated in (`generate_meta_constraints()` before
    /// `generate_config_constraints()`).
    pub fn all_facts(&self) -> Vec<z3::ast::Bool<'ctx>> {
        self.meta.iter().chain(self.config.iter()).cloned().collect()
    }

    /// The closed universe of declared object constants plus `nil`, the
    /// domain `sum`/`count` range over.
    pub fn instance_universe(&self) -> Vec<z3::ast::Dynamic<'ctx>> {
        self.smt.all_inst_consts(&self.object_order)
    }

    /// Call before lowering a `sum`/`count` aggregation: both depend on the
    /// declared object universe being fixed, so they're rejected with an
    /// explicit, catchable error if config facts haven't been generated yet.
    pub fn require_config_generated(&self) -> Result<()> {
        if self.config_generated {
            Ok(())
        } else {
            Err(OrderingError::AggregationBeforeConfig.into())
        }
    }
}
