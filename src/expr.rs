//! The expression algebra: object terms, data terms, and partial
//! expressions with free-variable slots, lowered to Z3 quantifiers and
//! joins.
//!
//! Every combinator returns a new value rather than mutating shared state
//! in place, so intermediate expressions can be freely reused across
//! multiple bindings without aliasing surprises.

use z3::ast::{Ast, Bool, Dynamic, Int};
use z3::Sort;

use crate::compiler::ModelContext;
use crate::ids::{ClassId, VarId};
use crate::schema::FeatureRange;

/// What kind of value a set's elements range over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElemKind {
    Object(ClassId),
    /// The element type of a `join`/product: one class per joined
    /// component, in join order. Repeated joining just appends, so a
    /// three-way product is `Joined(vec![a, b, c])` whichever order the
    /// `.join()` calls were nested in.
    Joined(Vec<ClassId>),
}

impl ElemKind {
    fn component_classes(&self) -> Vec<ClassId> {
        match self {
            ElemKind::Object(id) => vec![*id],
            ElemKind::Joined(ids) => ids.clone(),
        }
    }
}

/// A value still missing zero or more free-variable bindings. `open`
/// tracks the [`VarId`]s appearing free in `body`, in binding order; once
/// empty the expression denotes a single ground Z3 term.
#[derive(Clone)]
pub struct PartialExpr<'ctx> {
    pub body: Dynamic<'ctx>,
    pub open: Vec<VarId>,
}

impl<'ctx> PartialExpr<'ctx> {
    pub fn ground(body: Dynamic<'ctx>) -> Self {
        Self { body, open: Vec::new() }
    }

    pub fn with_slot(body: Dynamic<'ctx>, var: VarId) -> Self {
        Self {
            body,
            open: vec![var],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.open.is_empty()
    }

    /// Bind the next open slot to a concrete value.
    pub fn bind(&self, ctx: &ModelContext<'ctx>, value: &Dynamic<'ctx>) -> Result<Self, crate::error::BindingError> {
        let Some((var, rest)) = self.open.split_first() else {
            return Err(crate::error::BindingError::DoubleBind {
                var: "<no open slot>".to_string(),
            });
        };
        let var_const = ctx.smt.var_const_ref(*var).clone();
        let body = crate::smt::Smt::substitute(&self.body, &[(var_const, value.clone())]);
        Ok(Self {
            body,
            open: rest.to_vec(),
        })
    }

    /// Bind every remaining slot, in order, to `values`.
    pub fn bind_all(&self, ctx: &ModelContext<'ctx>, values: &[Dynamic<'ctx>]) -> Result<Self, crate::error::BindingError> {
        let mut current = self.clone();
        for value in values {
            current = current.bind(ctx, value)?;
        }
        Ok(current)
    }

    /// Finish a fully-bound expression into a ground term.
    pub fn complete(&self) -> Result<Dynamic<'ctx>, crate::error::BindingError> {
        if !self.is_complete() {
            return Err(crate::error::BindingError::UnboundSlot {
                var: format!("{:?}", self.open[0]),
            });
        }
        Ok(self.body.clone())
    }

    pub fn as_bool(&self) -> Result<Bool<'ctx>, crate::error::BindingError> {
        self.complete()?.as_bool().ok_or(crate::error::BindingError::WrongKind {
            expected: "Bool",
            found: "other",
        })
    }

    pub fn as_int(&self) -> Result<Int<'ctx>, crate::error::BindingError> {
        self.complete()?.as_int().ok_or(crate::error::BindingError::WrongKind {
            expected: "Int",
            found: "other",
        })
    }

    /// Is `other` an instance of whatever `self` actually turned out to be?
    /// `is_instance(other, actual_type(self))`.
    pub fn sametype(&self, ctx: &ModelContext<'ctx>, other: &Dynamic<'ctx>) -> Result<Bool<'ctx>, crate::error::BindingError> {
        let self_term = self.complete()?;
        let actual = ctx.smt.actual_type.apply(&[&self_term]);
        Ok(ctx.smt.is_instance.apply(&[other, &actual]).as_bool().unwrap())
    }

    /// `self == nil`, the dual of aliveness — used for optional
    /// single-valued references that were never assigned a target.
    pub fn undefined(&self, ctx: &ModelContext<'ctx>) -> Result<Bool<'ctx>, crate::error::BindingError> {
        Ok(self.complete()?._eq(&ctx.smt.nil))
    }
}

/// A set expression: a guard predicate over one or more bound variables,
/// paired with the element type it ranges over. A plain set (`all_instances`,
/// `filter`, `join_reference`) has exactly one bound variable; `join`
/// produces a product set with one bound variable per joined component.
///
/// `seed` is present once `.map` has been applied: the set's elements are
/// no longer the raw bound variable but `seed` evaluated at it, and later
/// `forall`/`exists`/`sum` bodies are substituted accordingly during
/// lowering. Only simple (single-variable) sets can carry a seed or be
/// aggregated over (`count`/`sum`/`contains`/`equals_literal`) — a joined
/// set has no single element to map or aggregate, so those operations
/// return [`crate::error::BindingError::CompoundSetNotSimple`] instead.
#[derive(Clone)]
pub struct SetTerm<'ctx> {
    pub elem_kind: ElemKind,
    pub bound_vars: Vec<VarId>,
    /// `guard(bound_vars...)`: true exactly for the elements of this set.
    pub guard: Bool<'ctx>,
    pub seed: Option<PartialExpr<'ctx>>,
}

impl<'ctx> SetTerm<'ctx> {
    /// The set of all live instances of `class` (and its live subclasses),
    /// the starting point for most joins: `alive(x) && is_instance(x, class)`.
    pub fn all_instances(ctx: &ModelContext<'ctx>, class: ClassId, var: VarId) -> Self {
        let var_const = ctx.smt.var_const_ref(var).clone();
        let class_const = ctx.smt.class_const_ref(class).clone();
        let alive = ctx.smt.alive.apply(&[&var_const]).as_bool().unwrap();
        let is_instance = ctx
            .smt
            .is_instance
            .apply(&[&var_const, &class_const])
            .as_bool()
            .unwrap();
        Self {
            elem_kind: ElemKind::Object(class),
            bound_vars: vec![var],
            guard: Bool::and(ctx.smt.ctx, &[&alive, &is_instance]),
            seed: None,
        }
    }

    /// Join through a reference feature: `{ y | exists x in self, y in feature(x) }`
    /// for multi-valued features, or the direct image for single-valued ones.
    /// This is a named-feature projection (`o.f`), distinct from [`Self::join`]'s
    /// generic product of two independent sets.
    pub fn join_reference(
        &self,
        ctx: &ModelContext<'ctx>,
        feature_name: &str,
        multiple: bool,
        target: ElemKind,
        source_var: VarId,
        target_var: VarId,
    ) -> Self {
        let source_const = ctx.smt.var_const_ref(source_var).clone();
        let target_const = ctx.smt.var_const_ref(target_var).clone();
        let feature = ctx.smt.feature_func_ref(feature_name).clone();

        let membership = if multiple {
            feature.apply(&[&source_const, &target_const]).as_bool().unwrap()
        } else {
            let image = feature.apply(&[&source_const]);
            image._eq(&target_const)
        };

        let source_in_self = self.holds_at(ctx, &source_const);

        let exists_source = z3::ast::exists_const(
            ctx.smt.ctx,
            &[&source_const],
            &[],
            &Bool::and(ctx.smt.ctx, &[&source_in_self, &membership]),
        );

        Self {
            elem_kind: target,
            bound_vars: vec![target_var],
            guard: exists_source,
            seed: None,
        }
    }

    /// The generic product `self × other`: two independent sets joined
    /// into one, keeping both bound variables and conjoining both guards.
    /// Quantifying over the result is equivalent to nesting the
    /// quantifier over each side: `(A × B).forall([x,y], p)` compiles to
    /// the same formula as `A.forall(x, B.forall(y, p))`. Arbitrary arity
    /// follows from repeated joining — `(A × B) × C` just concatenates
    /// bound variables and element classes again.
    pub fn join(&self, ctx: &ModelContext<'ctx>, other: &Self) -> Self {
        let mut bound_vars = self.bound_vars.clone();
        bound_vars.extend(other.bound_vars.iter().copied());

        let mut classes = self.elem_kind.component_classes();
        classes.extend(other.elem_kind.component_classes());

        Self {
            elem_kind: ElemKind::Joined(classes),
            bound_vars,
            guard: Bool::and(ctx.smt.ctx, &[&self.guard, &other.guard]),
            seed: None,
        }
    }

    /// Narrow this set to only the elements also satisfying `predicate`
    /// (a ground `Bool` in terms of `self.bound_vars`).
    pub fn filter(&self, ctx: &ModelContext<'ctx>, predicate: &Bool<'ctx>) -> Self {
        Self {
            elem_kind: self.elem_kind.clone(),
            bound_vars: self.bound_vars.clone(),
            guard: Bool::and(ctx.smt.ctx, &[&self.guard, predicate]),
            seed: self.seed.clone(),
        }
    }

    /// `S.map(v, expr)`: keep this set's guard, but have every later body
    /// built against it be evaluated through `expr` instead of the raw
    /// bound variable. `expr` must be built from this set's own (single)
    /// bound variable — the `v` in `S.map(v, expr)`; `target_var` is the
    /// variable later `forall`/`exists`/`sum` bodies are written in terms
    /// of instead. Only defined for a simple (single-variable) set.
    pub fn map(&self, target_var: VarId, expr: Dynamic<'ctx>, target_elem_kind: ElemKind) -> Result<Self, crate::error::BindingError> {
        if self.bound_vars.len() != 1 {
            return Err(crate::error::BindingError::CompoundSetNotSimple { operation: "map" });
        }
        Ok(Self {
            elem_kind: target_elem_kind,
            bound_vars: self.bound_vars.clone(),
            guard: self.guard.clone(),
            seed: Some(PartialExpr::with_slot(expr, target_var)),
        })
    }

    /// `forall x in self. body(x)`, lowered to `forall x.... guard(x...) -> body(x...)`.
    /// If this set has a seed, `body` is substituted through it first — it's
    /// written in terms of the seed's target variable, not the raw bound
    /// variable.
    pub fn forall(&self, ctx: &ModelContext<'ctx>, body: &Bool<'ctx>) -> Bool<'ctx> {
        let var_consts = self.bound_var_consts(ctx);
        let refs: Vec<&Dynamic<'ctx>> = var_consts.iter().collect();
        let body = self.apply_seed(ctx, body);
        z3::ast::forall_const(ctx.smt.ctx, &refs, &[], &self.guard.implies(&body))
    }

    /// `exists x in self. body(x)`, lowered to `exists x.... guard(x...) && body(x...)`.
    pub fn exists(&self, ctx: &ModelContext<'ctx>, body: &Bool<'ctx>) -> Bool<'ctx> {
        let var_consts = self.bound_var_consts(ctx);
        let refs: Vec<&Dynamic<'ctx>> = var_consts.iter().collect();
        let body = self.apply_seed(ctx, body);
        z3::ast::exists_const(ctx.smt.ctx, &refs, &[], &Bool::and(ctx.smt.ctx, &[&self.guard, &body]))
    }

    /// `otherwise x in self. body(x)`, lowered to `forall x. guard(x) || body(x)`.
    /// Reads as "for instances outside this set, body must hold"; used to
    /// zero out a reference's members that fall outside its declared range
    /// (see [`crate::universe`]'s multi-valued well-typedness axiom).
    pub fn otherwise(&self, ctx: &ModelContext<'ctx>, body: &Bool<'ctx>) -> Bool<'ctx> {
        let var_consts = self.bound_var_consts(ctx);
        let refs: Vec<&Dynamic<'ctx>> = var_consts.iter().collect();
        let body = self.apply_seed(ctx, body);
        z3::ast::forall_const(ctx.smt.ctx, &refs, &[], &Bool::or(ctx.smt.ctx, &[&self.guard, &body]))
    }

    /// `existsOne x in self. body(x)`: there is some `x` satisfying `body`,
    /// and every other member of `self` satisfying `body` equals it. The
    /// uniqueness half is expressed with a second bound variable. Only
    /// defined for a simple (single-variable) set.
    pub fn exists_one(
        &self,
        ctx: &ModelContext<'ctx>,
        body_of: impl Fn(&Dynamic<'ctx>) -> Bool<'ctx>,
    ) -> Result<Bool<'ctx>, crate::error::BindingError> {
        if self.bound_vars.len() != 1 {
            return Err(crate::error::BindingError::CompoundSetNotSimple { operation: "exists_one" });
        }
        let sort = self.bound_var_sort(ctx);
        let witness = ctx.smt.fresh_const(&sort, "exists_one_witness");
        let other = ctx.smt.fresh_const(&sort, "exists_one_other");

        let witness_holds = Bool::and(ctx.smt.ctx, &[&self.holds_at(ctx, &witness), &body_of(&witness)]);

        let other_implies_eq = {
            let other_guard = self.holds_at(ctx, &other);
            let other_body = body_of(&other);
            let other_holds = Bool::and(ctx.smt.ctx, &[&other_guard, &other_body]);
            z3::ast::forall_const(ctx.smt.ctx, &[&other], &[], &other_holds.implies(&other._eq(&witness)))
        };

        Ok(z3::ast::exists_const(
            ctx.smt.ctx,
            &[&witness],
            &[],
            &Bool::and(ctx.smt.ctx, &[&witness_holds, &other_implies_eq]),
        ))
    }

    /// `count(self)`: the number of live elements satisfying the guard,
    /// computed as a sum of 0/1 indicators over the closed universe. Only
    /// valid once the config facts fixing the universe's membership have
    /// been generated — see [`crate::compiler::ModelContext::generate_config_constraints`].
    /// Only defined for a simple (single-variable) set.
    pub fn count(&self, ctx: &ModelContext<'ctx>, universe: &[Dynamic<'ctx>]) -> Result<Int<'ctx>, crate::error::BindingError> {
        if self.bound_vars.len() != 1 {
            return Err(crate::error::BindingError::CompoundSetNotSimple { operation: "count" });
        }
        let terms: Vec<Int<'ctx>> = universe
            .iter()
            .map(|elem| {
                let holds = self.holds_at(ctx, elem);
                holds.ite(&Int::from_i64(ctx.smt.ctx, 1), &Int::from_i64(ctx.smt.ctx, 0))
            })
            .collect();
        let refs: Vec<&Int<'ctx>> = terms.iter().collect();
        Ok(Int::add(ctx.smt.ctx, &refs))
    }

    /// `sum(self, attribute)`: the sum of an integer attribute over the
    /// elements of this set, zero for elements not in the set. If this set
    /// has a seed, the attribute is read off `expr(elem)` rather than
    /// `elem` itself. Only defined for a simple (single-variable) set.
    pub fn sum(&self, ctx: &ModelContext<'ctx>, attribute: &str, universe: &[Dynamic<'ctx>]) -> Result<Int<'ctx>, crate::error::BindingError> {
        if self.bound_vars.len() != 1 {
            return Err(crate::error::BindingError::CompoundSetNotSimple { operation: "sum" });
        }
        let feature = ctx.smt.feature_func_ref(attribute).clone();
        let terms: Vec<Int<'ctx>> = universe
            .iter()
            .map(|elem| {
                let holds = self.holds_at(ctx, elem);
                let value_source = self.seeded_at(ctx, elem);
                let value = feature.apply(&[&value_source]).as_int().unwrap();
                holds.ite(&value, &Int::from_i64(ctx.smt.ctx, 0))
            })
            .collect();
        let refs: Vec<&Int<'ctx>> = terms.iter().collect();
        Ok(Int::add(ctx.smt.ctx, &refs))
    }

    /// `self.contains(elem)`. For an unmapped set, substitutes `elem` for
    /// the bound variable directly; for a mapped set, existentially
    /// quantifies over the bound variable since `elem` must equal its
    /// image under the seed rather than the bound variable itself. Only
    /// defined for a simple (single-variable) set.
    pub fn contains(&self, ctx: &ModelContext<'ctx>, elem: &Dynamic<'ctx>) -> Result<Bool<'ctx>, crate::error::BindingError> {
        if self.bound_vars.len() != 1 {
            return Err(crate::error::BindingError::CompoundSetNotSimple { operation: "contains" });
        }
        match &self.seed {
            None => Ok(self.holds_at(ctx, elem)),
            Some(seed) => {
                let bound_const = ctx.smt.var_const_ref(self.bound_vars[0]).clone();
                let holds = Bool::and(ctx.smt.ctx, &[&self.guard, &seed.body._eq(elem)]);
                Ok(z3::ast::exists_const(ctx.smt.ctx, &[&bound_const], &[], &holds))
            }
        }
    }

    /// Set-literal equality: two sets over the same domain are equal iff
    /// every concrete universe element is a member of `self` exactly when
    /// it's one of `members`. Only defined for a simple (single-variable)
    /// set.
    pub fn equals_literal(&self, ctx: &ModelContext<'ctx>, members: &[Dynamic<'ctx>], universe: &[Dynamic<'ctx>]) -> Result<Bool<'ctx>, crate::error::BindingError> {
        if self.bound_vars.len() != 1 {
            return Err(crate::error::BindingError::CompoundSetNotSimple { operation: "equals_literal" });
        }
        let clauses: Vec<Bool<'ctx>> = universe
            .iter()
            .map(|elem| {
                let in_self = self.contains(ctx, elem).expect("bound_vars.len() == 1 checked above");
                let in_literal = members.iter().any(|m| m == elem);
                if in_literal {
                    in_self
                } else {
                    in_self.not()
                }
            })
            .collect();
        let refs: Vec<&Bool<'ctx>> = clauses.iter().collect();
        Ok(Bool::and(ctx.smt.ctx, &refs))
    }

    fn bound_var_consts(&self, ctx: &ModelContext<'ctx>) -> Vec<Dynamic<'ctx>> {
        self.bound_vars.iter().map(|v| ctx.smt.var_const_ref(*v).clone()).collect()
    }

    /// `guard` with the (single) bound variable substituted by `elem`.
    fn holds_at(&self, ctx: &ModelContext<'ctx>, elem: &Dynamic<'ctx>) -> Bool<'ctx> {
        let bound_const = ctx.smt.var_const_ref(self.bound_vars[0]).clone();
        crate::smt::Smt::substitute(&Dynamic::from_ast(&self.guard), &[(bound_const, elem.clone())])
            .as_bool()
            .unwrap()
    }

    /// The value a simple set's element resolves to at `elem`: `elem`
    /// itself if there's no seed, otherwise the seed expression evaluated
    /// with the bound variable substituted by `elem`.
    fn seeded_at(&self, ctx: &ModelContext<'ctx>, elem: &Dynamic<'ctx>) -> Dynamic<'ctx> {
        match &self.seed {
            None => elem.clone(),
            Some(seed) => {
                let bound_const = ctx.smt.var_const_ref(self.bound_vars[0]).clone();
                crate::smt::Smt::substitute(&seed.body, &[(bound_const, elem.clone())])
            }
        }
    }

    /// Substitute `body` (written in terms of the seed's target variable)
    /// through the seed, or leave it untouched if there's no seed.
    fn apply_seed(&self, ctx: &ModelContext<'ctx>, body: &Bool<'ctx>) -> Bool<'ctx> {
        match &self.seed {
            None => body.clone(),
            Some(seed) => {
                let target_const = ctx.smt.var_const_ref(seed.open[0]).clone();
                crate::smt::Smt::substitute(&Dynamic::from_ast(body), &[(target_const, seed.body.clone())])
                    .as_bool()
                    .unwrap()
            }
        }
    }

    fn bound_var_sort(&self, ctx: &ModelContext<'ctx>) -> Sort<'ctx> {
        match &self.elem_kind {
            ElemKind::Object(_) | ElemKind::Joined(_) => ctx.smt.inst_sort.clone(),
        }
    }
}

/// Resolve a schema [`FeatureRange`] into the [`ElemKind`] a set projected
/// through that feature would have.
pub fn elem_kind_of(range: FeatureRange) -> ElemKind {
    match range {
        FeatureRange::Class(id) => ElemKind::Object(id),
        FeatureRange::Data(_) => unreachable!("elem_kind_of is only called for reference features"),
    }
}
