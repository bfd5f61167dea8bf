//! The persistent Z3 bindings backing the meta-model: sorts, the built-in
//! closed-world predicates, and the lazily-created constants/functions for
//! every declared class, enum, feature, object, and variable.
//!
//! Unlike a one-shot verifier that creates a *fresh* `z3::Context` per call
//! because each check is single-shot, this model needs one long-lived
//! universe that many `check()`/`push()`/`pop()` calls share — so
//! `Smt<'ctx>` borrows the `z3::Context` for as long as the caller keeps it
//! alive instead of owning one itself.

use std::cell::Cell;
use std::collections::HashMap;

use z3::ast::{Ast, Dynamic};
use z3::{Context, DatatypeBuilder, DatatypeSort, FuncDecl, Sort, Symbol};

use crate::domain::{Domain, Enumeration};
use crate::ids::{ClassId, EnumId, ObjectId, VarId};
use crate::schema::FeatureRange;

/// A built Z3 datatype sort for one declared enumeration, plus the
/// constructor `FuncDecl` for each tagged value in declaration order.
pub struct EnumSortInfo<'ctx> {
    pub sort: Sort<'ctx>,
    pub constructors: Vec<FuncDecl<'ctx>>,
}

/// The Z3-side state of the model: everything that has a `'ctx`-bound
/// lifetime.
pub struct Smt<'ctx> {
    pub ctx: &'ctx Context,

    pub type_sort: Sort<'ctx>,
    pub inst_sort: Sort<'ctx>,

    /// The `NilType` constant of sort `Type`.
    pub nil_type: Dynamic<'ctx>,
    /// The `nil` constant of sort `Inst`.
    pub nil: Dynamic<'ctx>,

    pub super_type: FuncDecl<'ctx>,
    pub actual_type: FuncDecl<'ctx>,
    pub is_subtype: FuncDecl<'ctx>,
    pub is_instance: FuncDecl<'ctx>,
    pub alive: FuncDecl<'ctx>,
    pub is_abstract: FuncDecl<'ctx>,

    class_consts: HashMap<ClassId, Dynamic<'ctx>>,
    enum_sorts: HashMap<EnumId, EnumSortInfo<'ctx>>,
    feature_funcs: HashMap<String, FuncDecl<'ctx>>,
    object_consts: HashMap<ObjectId, Dynamic<'ctx>>,
    var_consts: HashMap<VarId, Dynamic<'ctx>>,

    fresh_counter: Cell<usize>,
}

impl<'ctx> Smt<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        let type_sort = Sort::uninterpreted(ctx, Symbol::from("Type"));
        let inst_sort = Sort::uninterpreted(ctx, Symbol::from("Inst"));

        let nil_type = Dynamic::new_const(ctx, "NilType", &type_sort);
        let nil = Dynamic::new_const(ctx, "nil", &inst_sort);

        let super_type = FuncDecl::new(ctx, "super", &[&type_sort], &type_sort);
        let actual_type = FuncDecl::new(ctx, "actual_type", &[&inst_sort], &type_sort);
        let is_subtype = FuncDecl::new(ctx, "is_subtype", &[&type_sort, &type_sort], &Sort::bool(ctx));
        let is_instance = FuncDecl::new(ctx, "is_instance", &[&inst_sort, &type_sort], &Sort::bool(ctx));
        let alive = FuncDecl::new(ctx, "alive", &[&inst_sort], &Sort::bool(ctx));
        let is_abstract = FuncDecl::new(ctx, "is_abstract", &[&type_sort], &Sort::bool(ctx));

        Self {
            ctx,
            type_sort,
            inst_sort,
            nil_type,
            nil,
            super_type,
            actual_type,
            is_subtype,
            is_instance,
            alive,
            is_abstract,
            class_consts: HashMap::new(),
            enum_sorts: HashMap::new(),
            feature_funcs: HashMap::new(),
            object_consts: HashMap::new(),
            var_consts: HashMap::new(),
            fresh_counter: Cell::new(0),
        }
    }

    pub fn class_const(&mut self, id: ClassId, name: &str) -> Dynamic<'ctx> {
        self.class_consts
            .entry(id)
            .or_insert_with(|| Dynamic::new_const(self.ctx, name, &self.type_sort))
            .clone()
    }

    pub fn class_const_ref(&self, id: ClassId) -> &Dynamic<'ctx> {
        self.class_consts
            .get(&id)
            .expect("class const created at define_class time")
    }

    pub fn object_const(&mut self, id: ObjectId, name: &str) -> Dynamic<'ctx> {
        self.object_consts
            .entry(id)
            .or_insert_with(|| Dynamic::new_const(self.ctx, name, &self.inst_sort))
            .clone()
    }

    pub fn object_const_ref(&self, id: ObjectId) -> &Dynamic<'ctx> {
        self.object_consts
            .get(&id)
            .expect("object const created at define_object time")
    }

    pub fn var_const(&mut self, id: VarId, name: &str, sort: &Sort<'ctx>) -> Dynamic<'ctx> {
        self.var_consts
            .entry(id)
            .or_insert_with(|| Dynamic::new_const(self.ctx, name, sort))
            .clone()
    }

    pub fn var_const_ref(&self, id: VarId) -> &Dynamic<'ctx> {
        self.var_consts.get(&id).expect("var const created at declare_var time")
    }

    pub fn define_enum(&mut self, id: EnumId, enumeration: &Enumeration) {
        let mut builder = DatatypeBuilder::new(self.ctx, enumeration.name.clone());
        for value in &enumeration.values {
            builder = builder.variant(value, vec![]);
        }
        let built: DatatypeSort<'ctx> = builder.finish();
        let constructors = built.variants.iter().map(|v| v.constructor.clone()).collect();
        self.enum_sorts.insert(
            id,
            EnumSortInfo {
                sort: built.sort,
                constructors,
            },
        );
    }

    pub fn enum_sort(&self, id: EnumId) -> &EnumSortInfo<'ctx> {
        self.enum_sorts.get(&id).expect("enum declared before use")
    }

    pub fn enum_value_const(&self, id: EnumId, index: usize) -> Dynamic<'ctx> {
        let info = self.enum_sort(id);
        info.constructors[index].apply(&[])
    }

    pub fn domain_sort(&self, domain: Domain) -> Sort<'ctx> {
        match domain {
            Domain::Integer => Sort::int(self.ctx),
            Domain::Boolean => Sort::bool(self.ctx),
            Domain::Enum(id) => self.enum_sort(id).sort.clone(),
        }
    }

    fn range_sort(&self, range: FeatureRange) -> Sort<'ctx> {
        match range {
            FeatureRange::Data(domain) => self.domain_sort(domain),
            FeatureRange::Class(_) => self.inst_sort.clone(),
        }
    }

    /// Get-or-create the global `FuncDecl` for a feature. Safe to call
    /// repeatedly for the same name: [`crate::schema::Schema`] already
    /// rejects shape-incompatible redeclarations before this runs, so the
    /// cached decl is always the right one.
    pub fn feature_func(&mut self, name: &str, range: FeatureRange, multiple: bool) -> FuncDecl<'ctx> {
        if let Some(existing) = self.feature_funcs.get(name) {
            return existing.clone();
        }
        let range_sort = self.range_sort(range);
        let decl = if multiple {
            FuncDecl::new(self.ctx, name, &[&self.inst_sort, &range_sort], &Sort::bool(self.ctx))
        } else {
            FuncDecl::new(self.ctx, name, &[&self.inst_sort], &range_sort)
        };
        self.feature_funcs.insert(name.to_string(), decl.clone());
        decl
    }

    pub fn feature_func_ref(&self, name: &str) -> &FuncDecl<'ctx> {
        self.feature_funcs.get(name).expect("feature declared before use")
    }

    /// A unique, never user-visible `Inst`-sorted constant, used for
    /// internally generated companion variables (e.g. `exists_one`'s
    /// uniqueness witness) that don't need to be tracked by
    /// [`crate::vars::VarRegistry`].
    pub fn fresh_const(&self, sort: &Sort<'ctx>, label: &str) -> Dynamic<'ctx> {
        let n = self.fresh_counter.get();
        self.fresh_counter.set(n + 1);
        Dynamic::new_const(self.ctx, format!("__internal_{label}_{n}"), sort)
    }

    /// Substitute `pairs` simultaneously (capture-free, since variable names
    /// are globally unique) into `body`.
    pub fn substitute(body: &Dynamic<'ctx>, pairs: &[(Dynamic<'ctx>, Dynamic<'ctx>)]) -> Dynamic<'ctx> {
        let refs: Vec<(&Dynamic<'ctx>, &Dynamic<'ctx>)> = pairs.iter().map(|(a, b)| (a, b)).collect();
        body.substitute(&refs)
    }

    /// Every declared class constant plus `NilType`, for the finite-domain
    /// closure axiom.
    pub fn all_type_consts(&self, order: &[ClassId]) -> Vec<Dynamic<'ctx>> {
        let mut result: Vec<Dynamic<'ctx>> = order.iter().map(|id| self.class_const_ref(*id).clone()).collect();
        result.push(self.nil_type.clone());
        result
    }

    /// Every declared object constant plus `nil`, for the finite-domain
    /// closure axiom.
    pub fn all_inst_consts(&self, order: &[ObjectId]) -> Vec<Dynamic<'ctx>> {
        let mut result: Vec<Dynamic<'ctx>> = order.iter().map(|id| self.object_const_ref(*id).clone()).collect();
        result.push(self.nil.clone());
        result
    }
}
