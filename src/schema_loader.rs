//! YAML schema loader: reads a class/enum schema document into a
//! [`crate::compiler::ModelContext`] in two passes, so that a class may
//! reference another class declared later in the same file (headers are
//! loaded before any feature's type is resolved against them).

use std::collections::HashMap;

use serde::Deserialize;

use crate::compiler::ModelContext;
use crate::domain::Domain;
use crate::error::{ModelError, Result, SchemaError};
use crate::ids::ClassId;
use crate::schema::FeatureRange;

#[derive(Debug, Deserialize)]
struct SchemaDoc {
    #[serde(default)]
    enums: HashMap<String, Vec<String>>,
    #[serde(default)]
    classes: HashMap<String, ClassDoc>,
}

#[derive(Debug, Deserialize)]
struct ClassDoc {
    #[serde(default)]
    supertype: Option<String>,
    #[serde(rename = "abstract", default)]
    abstract_: bool,
    #[serde(default)]
    attributes: HashMap<String, AttributeDoc>,
    #[serde(default)]
    references: HashMap<String, ReferenceDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttributeDoc {
    /// `radius: Integer`
    Shorthand(String),
    /// `tags: {type: Integer, multiple: true}`
    Full {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        multiple: bool,
    },
}

#[derive(Debug, Deserialize)]
struct ReferenceDoc {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    multiple: bool,
    #[serde(default)]
    mandatory: bool,
    #[serde(default)]
    opposite: Option<String>,
}

/// Load a YAML schema document, declaring every enum and class it
/// contains into `ctx`.
pub fn load_schema<'ctx>(ctx: &mut ModelContext<'ctx>, yaml: &str) -> Result<()> {
    let doc: SchemaDoc = serde_yaml::from_str(yaml).map_err(|e| {
        ModelError::Schema(SchemaError::UnknownType {
            feature: "<document>".to_string(),
            type_name: format!("invalid YAML: {e}"),
        })
    })?;

    load_enums(ctx, &doc)?;
    let class_ids = load_class_heads(ctx, &doc)?;
    load_class_bodies(ctx, &doc, &class_ids)?;
    Ok(())
}

fn load_enums<'ctx>(ctx: &mut ModelContext<'ctx>, doc: &SchemaDoc) -> Result<()> {
    let mut names: Vec<&String> = doc.enums.keys().collect();
    names.sort();
    for name in names {
        let values = doc.enums[name].clone();
        ctx.define_enum(name.clone(), values)?;
    }
    Ok(())
}

/// First pass: declare every class's name/supertype/abstractness, so a
/// feature in the second pass can reference any class in the document
/// regardless of declaration order.
fn load_class_heads<'ctx>(ctx: &mut ModelContext<'ctx>, doc: &SchemaDoc) -> Result<HashMap<String, ClassId>> {
    let mut names: Vec<&String> = doc.classes.keys().collect();
    names.sort();

    let mut pending = names;
    let mut class_ids: HashMap<String, ClassId> = HashMap::new();

    // Classes may be declared in any order relative to their supertype, so
    // iterate to a fixed point rather than requiring supertypes first.
    while !pending.is_empty() {
        let mut made_progress = false;
        let mut next_pending = Vec::new();

        for name in pending {
            let class_doc = &doc.classes[name];
            let supertype = match &class_doc.supertype {
                Some(super_name) => match class_ids.get(super_name) {
                    Some(id) => Some(*id),
                    None if doc.classes.contains_key(super_name) => {
                        next_pending.push(name);
                        continue;
                    }
                    None => {
                        return Err(SchemaError::UnknownSupertype {
                            class: name.clone(),
                            supertype: super_name.clone(),
                        }
                        .into())
                    }
                },
                None => None,
            };
            let id = ctx.define_class(name.clone(), supertype, class_doc.abstract_)?;
            class_ids.insert(name.clone(), id);
            made_progress = true;
        }

        if !made_progress {
            let stuck = next_pending.first().cloned().unwrap_or(&String::new()).clone();
            return Err(SchemaError::UnknownSupertype {
                class: stuck,
                supertype: "<cyclic supertype chain>".to_string(),
            }
            .into());
        }
        pending = next_pending;
    }

    Ok(class_ids)
}

/// Second pass: attributes and references, now that every class head
/// exists.
fn load_class_bodies<'ctx>(ctx: &mut ModelContext<'ctx>, doc: &SchemaDoc, class_ids: &HashMap<String, ClassId>) -> Result<()> {
    let mut names: Vec<&String> = doc.classes.keys().collect();
    names.sort();

    for name in names {
        let class_doc = &doc.classes[name];
        let class_id = class_ids[name];

        let mut attr_names: Vec<&String> = class_doc.attributes.keys().collect();
        attr_names.sort();
        for attr_name in attr_names {
            let attr_doc = &class_doc.attributes[attr_name];
            let (type_name, multiple) = match attr_doc {
                AttributeDoc::Shorthand(t) => (t.clone(), false),
                AttributeDoc::Full { type_name, multiple } => (type_name.clone(), *multiple),
            };
            let domain = resolve_domain(ctx, name, attr_name, &type_name)?;
            ctx.define_attribute(class_id, attr_name.clone(), domain, multiple)?;
        }

        let mut ref_names: Vec<&String> = class_doc.references.keys().collect();
        ref_names.sort();
        for ref_name in ref_names {
            let ref_doc = &class_doc.references[ref_name];
            let target = class_ids.get(&ref_doc.type_name).copied().ok_or_else(|| SchemaError::UnknownType {
                feature: ref_name.clone(),
                type_name: ref_doc.type_name.clone(),
            })?;
            ctx.define_reference(
                class_id,
                ref_name.clone(),
                target,
                ref_doc.multiple,
                ref_doc.mandatory,
                ref_doc.opposite.clone(),
            )?;
        }
    }
    Ok(())
}

fn resolve_domain<'ctx>(ctx: &ModelContext<'ctx>, class_name: &str, feature_name: &str, type_name: &str) -> Result<Domain> {
    match ctx.schema.resolve_type(type_name) {
        Some(FeatureRange::Data(domain)) => Ok(domain),
        Some(FeatureRange::Class(_)) => Err(SchemaError::UnknownType {
            feature: format!("{class_name}.{feature_name}"),
            type_name: format!("\"{type_name}\" names a class; attributes must be primitive or enum-typed"),
        }
        .into()),
        None => Err(SchemaError::UnknownType {
            feature: format!("{class_name}.{feature_name}"),
            type_name: type_name.to_string(),
        }
        .into()),
    }
}
