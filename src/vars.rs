//! Free-variable declarations (`declare_var`) used in quantifiers and
//! partial expressions.

use std::cell::Cell;
use std::collections::HashMap;

use crate::domain::Domain;
use crate::error::{Result, SchemaError};
use crate::ids::{ClassId, VarId};

/// The sort a variable ranges over: an object class, or a primitive domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Object(ClassId),
    Data(Domain),
}

#[derive(Debug, Clone)]
pub struct VarDef {
    pub id: VarId,
    pub name: String,
    pub kind: VarKind,
}

/// Registry of user-declared and internally-generated (fresh) variables.
///
/// Auto-named variables follow a `var<TypeLabel><n>` scheme (e.g.
/// `varPerson3`) so they read sensibly in debug output even when the
/// caller never supplies an explicit id.
#[derive(Debug, Default)]
pub struct VarRegistry {
    vars: Vec<VarDef>,
    by_name: HashMap<String, VarId>,
    fresh_counter: Cell<usize>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_var(&mut self, kind: VarKind, id: Option<&str>, type_label: &str) -> Result<VarId> {
        let name = match id {
            Some(id) => {
                if self.by_name.contains_key(id) {
                    return Err(SchemaError::DuplicateName {
                        kind: "variable",
                        name: id.to_string(),
                    }
                    .into());
                }
                id.to_string()
            }
            None => {
                let n = self.fresh_counter.get() + self.vars.len() + 1;
                format!("var{type_label}{n}")
            }
        };
        let var_id = VarId(self.vars.len());
        self.by_name.insert(name.clone(), var_id);
        self.vars.push(VarDef {
            id: var_id,
            name,
            kind,
        });
        Ok(var_id)
    }

    /// Allocate a variable purely for internal use during quantifier
    /// lowering (e.g. the companion variable in `exists_one`), guaranteed
    /// not to collide with any user-visible name.
    pub fn fresh(&mut self, kind: VarKind, type_label: &str) -> VarId {
        let n = self.fresh_counter.get();
        self.fresh_counter.set(n + 1);
        let name = format!("__fresh_{type_label}_{n}");
        let var_id = VarId(self.vars.len());
        self.by_name.insert(name.clone(), var_id);
        self.vars.push(VarDef {
            id: var_id,
            name,
            kind,
        });
        var_id
    }

    pub fn get(&self, id: VarId) -> &VarDef {
        &self.vars[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }
}
