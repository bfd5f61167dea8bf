//! The class schema: a registry of classes with attributes, references,
//! single inheritance, and opposite pairings.
//!
//! Feature lookup walks the supertype chain; features are keyed globally
//! by name — identical names on different classes collide by design and
//! must be the same logical function.

use std::collections::HashMap;

use crate::domain::{Domain, Enumeration};
use crate::error::{Result, SchemaError};
use crate::ids::{ClassId, EnumId};

/// The range of a feature: either a primitive [`Domain`] (attributes) or a
/// class (references).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureRange {
    Data(Domain),
    Class(ClassId),
}

/// An attribute or reference, globally keyed by name.
#[derive(Debug, Clone)]
pub struct FeatureDef {
    pub name: String,
    pub range: FeatureRange,
    pub multiple: bool,
    /// Only meaningful for references: a mandatory single-valued reference
    /// on a live instance is never `nil`.
    pub mandatory: bool,
    /// Only meaningful for references: the opposite feature name on the
    /// target class, resolved lazily.
    pub opposite: Option<String>,
}

impl FeatureDef {
    pub fn is_reference(&self) -> bool {
        matches!(self.range, FeatureRange::Class(_))
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.range, FeatureRange::Data(_))
    }

    fn shape_matches(&self, other: &FeatureDef) -> bool {
        self.range == other.range && self.multiple == other.multiple && self.mandatory == other.mandatory
    }
}

/// A declared class: name, optional supertype, abstractness, and its own
/// (not inherited) features.
#[derive(Debug, Clone)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub supertype: Option<ClassId>,
    pub abstract_: bool,
    pub attributes: HashMap<String, FeatureDef>,
    pub references: HashMap<String, FeatureDef>,
}

impl Class {
    fn own_feature(&self, name: &str) -> Option<&FeatureDef> {
        self.attributes.get(name).or_else(|| self.references.get(name))
    }
}

/// Registry of classes and enumerations declared so far.
///
/// Append-only except for dropping the whole [`crate::ModelContext`], which
/// is the reset point for starting a fresh model.
#[derive(Debug, Default)]
pub struct Schema {
    classes: Vec<Class>,
    class_by_name: HashMap<String, ClassId>,
    enums: Vec<Enumeration>,
    enum_by_name: HashMap<String, EnumId>,
    /// Every feature ever declared, by name, for the global-collision check.
    feature_shapes: HashMap<String, FeatureDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_enum(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<EnumId> {
        let name = name.into();
        if self.enum_by_name.contains_key(&name) {
            return Err(SchemaError::DuplicateName {
                kind: "enum",
                name,
            }
            .into());
        }
        let id = EnumId(self.enums.len());
        self.enum_by_name.insert(name.clone(), id);
        self.enums.push(Enumeration::new(name, values));
        Ok(id)
    }

    pub fn enum_by_name(&self, name: &str) -> Option<EnumId> {
        self.enum_by_name.get(name).copied()
    }

    pub fn enum_(&self, id: EnumId) -> &Enumeration {
        &self.enums[id.0]
    }

    pub fn enums(&self) -> &[Enumeration] {
        &self.enums
    }

    /// Resolve a schema type string (`"Integer"`, `"Boolean"`, an enum name,
    /// or a declared class name) into a [`FeatureRange`].
    pub fn resolve_type(&self, type_name: &str) -> Option<FeatureRange> {
        match type_name {
            "Integer" => Some(FeatureRange::Data(Domain::Integer)),
            "Boolean" => Some(FeatureRange::Data(Domain::Boolean)),
            _ => {
                if let Some(id) = self.class_by_name(type_name) {
                    Some(FeatureRange::Class(id))
                } else {
                    self.enum_by_name(type_name)
                        .map(|id| FeatureRange::Data(Domain::Enum(id)))
                }
            }
        }
    }

    pub fn define_class(
        &mut self,
        name: impl Into<String>,
        supertype: Option<ClassId>,
        abstract_: bool,
    ) -> Result<ClassId> {
        let name = name.into();
        if self.class_by_name.contains_key(&name) {
            return Err(SchemaError::DuplicateClass { name }.into());
        }
        let id = ClassId(self.classes.len());
        self.class_by_name.insert(name.clone(), id);
        self.classes.push(Class {
            id,
            name,
            supertype,
            abstract_,
            attributes: HashMap::new(),
            references: HashMap::new(),
        });
        Ok(id)
    }

    pub fn define_attribute(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        domain: Domain,
        multiple: bool,
    ) -> Result<()> {
        let name = name.into();
        let def = FeatureDef {
            name: name.clone(),
            range: FeatureRange::Data(domain),
            multiple,
            mandatory: true,
            opposite: None,
        };
        self.register_feature_shape(&def)?;
        self.classes[class.0].attributes.insert(name, def);
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
        let def = FeatureDef {
            name: name.clone(),
            range: FeatureRange::Class(target),
            multiple,
            mandatory: if multiple { false } else { mandatory },
            opposite,
        };
        self.register_feature_shape(&def)?;
        self.classes[class.0].references.insert(name, def);
        Ok(())
    }

    fn register_feature_shape(&mut self, def: &FeatureDef) -> Result<()> {
        if let Some(existing) = self.feature_shapes.get(&def.name) {
            if !existing.shape_matches(def) {
                return Err(SchemaError::IncompatibleFeatureRedeclaration {
                    feature: def.name.clone(),
                }
                .into());
            }
        } else {
            self.feature_shapes.insert(def.name.clone(), def.clone());
        }
        Ok(())
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Walk the supertype chain looking for `feature`.
    pub fn get_feature(&self, class: ClassId, feature: &str) -> Option<&FeatureDef> {
        let mut current = Some(class);
        while let Some(c) = current {
            let class_ref = &self.classes[c.0];
            if let Some(f) = class_ref.own_feature(feature) {
                return Some(f);
            }
            current = class_ref.supertype;
        }
        None
    }

    /// All ancestors of `class`, nearest first, not including `class`.
    pub fn ancestors(&self, class: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        let mut current = self.classes[class.0].supertype;
        while let Some(c) = current {
            result.push(c);
            current = self.classes[c.0].supertype;
        }
        result
    }

    /// Statically declared subtyping: is `sub` the same class as `sup`, or
    /// does `sub`'s ancestor chain reach `sup`? Used to filter the object
    /// universe for `sum`/`count` aggregation.
    pub fn is_subtype_decl(&self, sub: ClassId, sup: ClassId) -> bool {
        sub == sup || self.ancestors(sub).contains(&sup)
    }

    /// All feature names reachable from `class` through the supertype
    /// chain, attributes and references together (used by the result
    /// decoder).
    pub fn all_feature_names(&self, class: ClassId) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut current = Some(class);
        while let Some(c) = current {
            let class_ref = &self.classes[c.0];
            seen.extend(class_ref.attributes.keys().cloned());
            seen.extend(class_ref.references.keys().cloned());
            current = class_ref.supertype;
        }
        let mut result: Vec<String> = seen.into_iter().collect();
        result.sort();
        result
    }

    /// Resolve an `opposite` feature name against its target class, failing
    /// if it doesn't exist there or isn't a reference.
    pub fn resolve_opposite(&self, reference: &FeatureDef, target: ClassId) -> Result<Option<&FeatureDef>> {
        let Some(opposite_name) = &reference.opposite else {
            return Ok(None);
        };
        let target_class = &self.classes[target.0];
        match self.get_feature(target, opposite_name) {
            Some(other) if other.is_reference() => Ok(Some(other)),
            _ => Err(SchemaError::UnknownOpposite {
                reference: reference.name.clone(),
                target_class: target_class.name.clone(),
                opposite: opposite_name.clone(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_lookup_walks_supertypes() {
        let mut schema = Schema::new();
        let base = schema.define_class("Animal", None, false).unwrap();
        schema
            .define_attribute(base, "legs", Domain::Integer, false)
            .unwrap();
        let dog = schema.define_class("Dog", Some(base), false).unwrap();

        assert!(schema.get_feature(dog, "legs").is_some());
        assert!(schema.get_feature(dog, "bark").is_none());
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let mut schema = Schema::new();
        schema.define_class("A", None, false).unwrap();
        let err = schema.define_class("A", None, false).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ModelError::Schema(SchemaError::DuplicateClass { .. })
        ));
    }

    #[test]
    fn incompatible_feature_redeclaration_is_rejected() {
        let mut schema = Schema::new();
        let a = schema.define_class("A", None, false).unwrap();
        let b = schema.define_class("B", None, false).unwrap();
        schema.define_attribute(a, "count", Domain::Integer, false).unwrap();
        let err = schema
            .define_attribute(b, "count", Domain::Boolean, false)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ModelError::Schema(SchemaError::IncompatibleFeatureRedeclaration { .. })
        ));
    }

    #[test]
    fn is_subtype_decl_reaches_ancestors() {
        let mut schema = Schema::new();
        let a = schema.define_class("A", None, false).unwrap();
        let b = schema.define_class("B", Some(a), false).unwrap();
        let c = schema.define_class("C", Some(b), false).unwrap();
        assert!(schema.is_subtype_decl(c, a));
        assert!(!schema.is_subtype_decl(a, c));
    }
}
