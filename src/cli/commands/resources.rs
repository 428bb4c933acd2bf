use serde_json::{json, Value};

use crate::cli::{utils::output_success, OutputFormat};
use crate::resources::{AssociationKind, Catalog};
use crate::types::Action;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let catalog = Catalog::standard();

    match output_format {
        OutputFormat::Json => {
            let resources: Vec<Value> = catalog
                .iter()
                .map(|resource| {
                    let fields: Vec<Value> = resource
                        .schema
                        .fields()
                        .map(|(name, field)| {
                            json!({
                                "name": name,
                                "type": field.column_type(),
                                "required": field.required,
                                "unique": field.unique,
                                "references": field.references,
                            })
                        })
                        .collect();
                    let associations: Vec<Value> = resource
                        .associations
                        .iter()
                        .map(|a| json!({ "name": a.name, "target": a.target, "linkable": is_linkable(&a.kind) }))
                        .collect();
                    let permissions: Vec<String> = Action::ALL.iter().map(|a| resource.permission(*a)).collect();
                    json!({
                        "name": resource.name,
                        "fields": fields,
                        "associations": associations,
                        "permissions": permissions,
                    })
                })
                .collect();
            output_success(output_format, "Resource catalog", Some(json!({ "resources": resources })))
        }
        OutputFormat::Text => {
            for resource in catalog.iter() {
                println!("{}", resource.name);
                for (name, field) in resource.schema.fields() {
                    let mut flags = vec![];
                    if field.required {
                        flags.push("required".to_string());
                    }
                    if field.unique {
                        flags.push("unique".to_string());
                    }
                    if let Some(target) = field.references {
                        flags.push(format!("-> {}", target));
                    }
                    println!("  {:<16} {:?} {}", name, field.column_type(), flags.join(", "));
                }
                for association in &resource.associations {
                    println!("  /{} -> {}", association.name, association.target);
                }
                let permissions: Vec<String> = Action::ALL.iter().map(|a| resource.permission(*a)).collect();
                println!("  permissions: {}", permissions.join(", "));
            }
            Ok(())
        }
    }
}

fn is_linkable(kind: &AssociationKind) -> bool {
    matches!(kind, AssociationKind::ManyToMany { .. })
}
