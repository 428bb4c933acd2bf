//! Resource catalog: every REST-exposed entity, its schema, permission
//! strings and nested associations. The name doubles as the table name and
//! the `/v1/{name}` path segment.

use std::collections::BTreeMap;

use crate::filter::Columns;
use crate::types::Action;
use crate::validation::Schema;

pub mod clients;
pub mod jobs;
pub mod orders;
pub mod permissions;
pub mod quotes;
pub mod roles;
pub mod services;
pub mod stocks;
pub mod suppliers;
pub mod users;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationKind {
    /// Children carry the owner's id in `foreign_key`
    HasMany { foreign_key: &'static str },
    /// Rows of `link_table` pair `owner_key` with `target_key`
    ManyToMany {
        link_table: &'static str,
        owner_key: &'static str,
        target_key: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Association {
    /// Path segment under `/v1/{resource}/:id/`
    pub name: &'static str,
    /// Resource listed through the association
    pub target: &'static str,
    pub kind: AssociationKind,
}

impl Association {
    pub fn has_many(name: &'static str, target: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            target,
            kind: AssociationKind::HasMany { foreign_key },
        }
    }

    pub fn many_to_many(
        name: &'static str,
        target: &'static str,
        link_table: &'static str,
        owner_key: &'static str,
        target_key: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            kind: AssociationKind::ManyToMany {
                link_table,
                owner_key,
                target_key,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub name: &'static str,
    /// Used in messages, e.g. "client 4 not found"
    pub singular: &'static str,
    pub schema: Schema,
    pub associations: Vec<Association>,
    columns: Columns,
}

impl ResourceDef {
    pub fn new(name: &'static str, singular: &'static str, schema: Schema) -> Self {
        let columns = schema.columns();
        Self {
            name,
            singular,
            schema,
            associations: vec![],
            columns,
        }
    }

    pub fn with_association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn table(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    pub fn permission(&self, action: Action) -> String {
        action.permission(self.name)
    }
}

/// Immutable registry of resources, shared by the router and services
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: BTreeMap<&'static str, ResourceDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, resource: ResourceDef) -> Self {
        self.resources.insert(resource.name, resource);
        self
    }

    /// Every business resource the API exposes
    pub fn standard() -> Self {
        Self::new()
            .register(clients::resource())
            .register(suppliers::resource())
            .register(services::resource())
            .register(stocks::resource())
            .register(quotes::resource())
            .register(orders::resource())
            .register(jobs::resource())
            .register(users::resource())
            .register(roles::resource())
            .register(permissions::resource())
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDef> {
        self.resources.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDef> {
        self.resources.values()
    }
}
