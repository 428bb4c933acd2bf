use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::{LinkSpec, Page, RecordStore, RepositoryError};
use crate::filter::{ColumnType, Condition, Filter, FilterData, FilterError, FilterOp, Query};
use crate::resources::{Association, AssociationKind, Catalog, ResourceDef};
use crate::types::{Actor, Record};
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidAssociation(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Business operations shared by every resource: validation, reference and
/// uniqueness checks, then the store call.
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn RecordStore>,
    catalog: Arc<Catalog>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn RecordStore>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Validated list query over `resource`'s allow-list
    pub fn build_query(&self, resource: &ResourceDef, data: FilterData) -> Result<Query, ServiceError> {
        let mut filter = Filter::new(resource.columns());
        filter.assign(data)?;
        Ok(filter.build())
    }

    pub async fn select_any(&self, resource: &ResourceDef, tenant_id: i64, data: FilterData) -> Result<Page, ServiceError> {
        let query = self.build_query(resource, data)?;
        debug!(resource = resource.name, tenant_id, limit = query.limit, offset = query.offset, "list");
        Ok(self.store.find_many(resource, tenant_id, &query).await?)
    }

    pub async fn select_404(
        &self,
        resource: &ResourceDef,
        tenant_id: i64,
        id: i64,
        attributes: Option<Vec<String>>,
    ) -> Result<Record, ServiceError> {
        let select = match attributes {
            Some(columns) => {
                let mut filter = Filter::new(resource.columns());
                filter.select(columns)?;
                filter.build().select
            }
            None => vec![],
        };
        self.store
            .find_by_id(resource, tenant_id, id, &select)
            .await?
            .ok_or_else(|| not_found(resource, id))
    }

    pub async fn create_one(&self, resource: &ResourceDef, actor: Actor, body: &Value) -> Result<Record, ServiceError> {
        let values = resource.schema.validate_create(body)?;
        self.check_references(resource, actor.tenant_id, &values).await?;
        self.check_unique(resource, actor.tenant_id, &values, None).await?;

        let record = self.store.insert(resource, actor, values).await?;
        info!(resource = resource.name, tenant_id = actor.tenant_id, id = ?record.get("id"), "created");
        Ok(record)
    }

    pub async fn update_404(
        &self,
        resource: &ResourceDef,
        actor: Actor,
        id: i64,
        body: &Value,
    ) -> Result<Record, ServiceError> {
        let values = resource.schema.validate_update(body)?;
        // Unknown ids answer 404 before any field-level check
        self.exists_404(resource, actor.tenant_id, id).await?;
        self.check_references(resource, actor.tenant_id, &values).await?;
        self.check_unique(resource, actor.tenant_id, &values, Some(id)).await?;

        let record = self
            .store
            .update(resource, actor, id, values)
            .await?
            .ok_or_else(|| not_found(resource, id))?;
        info!(resource = resource.name, tenant_id = actor.tenant_id, id, "updated");
        Ok(record)
    }

    pub async fn delete_404(&self, resource: &ResourceDef, actor: Actor, id: i64) -> Result<Record, ServiceError> {
        let record = self
            .store
            .soft_delete(resource, actor, id)
            .await?
            .ok_or_else(|| not_found(resource, id))?;
        info!(resource = resource.name, tenant_id = actor.tenant_id, id, "deleted");
        Ok(record)
    }

    /// Records reachable from `owner_id` through `association`
    pub async fn select_associated(
        &self,
        owner: &ResourceDef,
        association: &Association,
        tenant_id: i64,
        owner_id: i64,
        data: FilterData,
    ) -> Result<Page, ServiceError> {
        self.exists_404(owner, tenant_id, owner_id).await?;
        let target = self.target(association)?;
        let mut filter = Filter::new(target.columns());
        filter.assign(data)?;

        match association.kind {
            AssociationKind::HasMany { foreign_key } => {
                filter.and_where(Condition::eq(foreign_key, ColumnType::Integer, Value::from(owner_id)));
                Ok(self.store.find_many(target, tenant_id, &filter.build()).await?)
            }
            AssociationKind::ManyToMany { .. } => {
                let link = link_spec(owner, association)?;
                Ok(self
                    .store
                    .find_linked(target, link, tenant_id, owner_id, &filter.build())
                    .await?)
            }
        }
    }

    /// Link `target_id` to `owner_id`, returning the linked target record
    pub async fn link_one(
        &self,
        owner: &ResourceDef,
        association: &Association,
        actor: Actor,
        owner_id: i64,
        target_id: i64,
    ) -> Result<Record, ServiceError> {
        let link = link_spec(owner, association)?;
        let target = self.target(association)?;
        self.exists_404(owner, actor.tenant_id, owner_id).await?;
        let record = self.select_404(target, actor.tenant_id, target_id, None).await?;

        if !self.store.link(link, actor, owner_id, target_id).await? {
            return Err(ServiceError::Conflict(format!(
                "{} {} is already linked to {} {}",
                target.singular, target_id, owner.singular, owner_id
            )));
        }
        info!(link = link.table, tenant_id = actor.tenant_id, owner_id, target_id, "linked");
        Ok(record)
    }

    pub async fn unlink_one(
        &self,
        owner: &ResourceDef,
        association: &Association,
        actor: Actor,
        owner_id: i64,
        target_id: i64,
    ) -> Result<(), ServiceError> {
        let link = link_spec(owner, association)?;
        if !self.store.unlink(link, actor.tenant_id, owner_id, target_id).await? {
            return Err(ServiceError::NotFound(format!(
                "{} {} is not linked to {} {}",
                association.target, target_id, owner.singular, owner_id
            )));
        }
        info!(link = link.table, tenant_id = actor.tenant_id, owner_id, target_id, "unlinked");
        Ok(())
    }

    async fn exists_404(&self, resource: &ResourceDef, tenant_id: i64, id: i64) -> Result<(), ServiceError> {
        let select = ["id".to_string()];
        match self.store.find_by_id(resource, tenant_id, id, &select).await? {
            Some(_) => Ok(()),
            None => Err(not_found(resource, id)),
        }
    }

    fn target(&self, association: &Association) -> Result<&ResourceDef, ServiceError> {
        self.catalog
            .get(association.target)
            .ok_or_else(|| ServiceError::InvalidAssociation(format!("unknown resource {}", association.target)))
    }

    /// Every non-null reference must point at a live record of the same tenant
    async fn check_references(&self, resource: &ResourceDef, tenant_id: i64, values: &Record) -> Result<(), ServiceError> {
        let mut errors = std::collections::BTreeMap::new();
        for (name, field) in resource.schema.fields() {
            let (Some(target_name), Some(id)) = (field.references, values.get(name).and_then(Value::as_i64)) else {
                continue;
            };
            let Some(target) = self.catalog.get(target_name) else {
                continue;
            };
            let select = ["id".to_string()];
            if self.store.find_by_id(target, tenant_id, id, &select).await?.is_none() {
                errors.insert(name.to_string(), format!("{} {} does not exist", target.singular, id));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(errors).into())
        }
    }

    async fn check_unique(
        &self,
        resource: &ResourceDef,
        tenant_id: i64,
        values: &Record,
        except_id: Option<i64>,
    ) -> Result<(), ServiceError> {
        for (name, field) in resource.schema.fields() {
            if !field.unique {
                continue;
            }
            let Some(value) = values.get(name).filter(|v| !v.is_null()) else {
                continue;
            };

            let mut condition = Condition::eq(name, field.column_type(), value.clone());
            if let Some(id) = except_id {
                condition = condition.and(Condition::Compare {
                    column: "id".to_string(),
                    column_type: ColumnType::Integer,
                    op: FilterOp::Ne,
                    value: Value::from(id),
                });
            }
            let query = Query {
                select: vec!["id".to_string()],
                condition,
                order: vec![],
                limit: 1,
                offset: 0,
            };
            if self.store.find_many(resource, tenant_id, &query).await?.total > 0 {
                return Err(ServiceError::Conflict(format!("{} {} is already taken", name, value)));
            }
        }
        Ok(())
    }
}

fn not_found(resource: &ResourceDef, id: i64) -> ServiceError {
    ServiceError::NotFound(format!("{} {} not found", resource.singular, id))
}

fn link_spec(owner: &ResourceDef, association: &Association) -> Result<LinkSpec, ServiceError> {
    match association.kind {
        AssociationKind::ManyToMany {
            link_table,
            owner_key,
            target_key,
        } => Ok(LinkSpec {
            table: link_table,
            owner_key,
            target_key,
        }),
        AssociationKind::HasMany { foreign_key } => Err(ServiceError::InvalidAssociation(format!(
            "{} are linked to a {} through their {} field",
            association.name, owner.singular, foreign_key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn service() -> ResourceService {
        ResourceService::new(Arc::new(MemoryStore::new()), Arc::new(Catalog::standard()))
    }

    const ACTOR: Actor = Actor { tenant_id: 1, user_id: 1 };

    #[tokio::test]
    async fn rejects_dangling_references() {
        let service = service();
        let quotes = service.catalog().get("quotes").unwrap().clone();
        match service.create_one(&quotes, ACTOR, &json!({ "client_id": 99 })).await {
            Err(ServiceError::Validation(ValidationError::Fields(fields))) => {
                assert_eq!(fields.get("client_id").map(String::as_str), Some("client 99 does not exist"));
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn unique_fields_conflict_within_tenant_only() {
        let service = service();
        let users = service.catalog().get("users").unwrap().clone();
        service.create_one(&users, ACTOR, &json!({ "email": "ann@example.com" })).await.unwrap();

        let duplicate = service.create_one(&users, ACTOR, &json!({ "email": "ANN@example.com" })).await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

        let other_tenant = Actor { tenant_id: 2, user_id: 1 };
        assert!(service.create_one(&users, other_tenant, &json!({ "email": "ann@example.com" })).await.is_ok());
    }

    #[tokio::test]
    async fn update_may_keep_its_own_unique_value() {
        let service = service();
        let roles = service.catalog().get("roles").unwrap().clone();
        let role = service.create_one(&roles, ACTOR, &json!({ "name": "admin" })).await.unwrap();
        let id = role["id"].as_i64().unwrap();
        let updated = service
            .update_404(&roles, ACTOR, id, &json!({ "name": "admin", "description": "everything" }))
            .await
            .unwrap();
        assert_eq!(updated["description"], json!("everything"));
        assert!(matches!(
            service.update_404(&roles, ACTOR, 404, &json!({ "name": "x" })).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn has_many_associations_cannot_be_linked() {
        let service = service();
        let clients = service.catalog().get("clients").unwrap().clone();
        let quotes = clients.association("quotes").unwrap().clone();
        assert!(matches!(
            service.link_one(&clients, &quotes, ACTOR, 1, 1).await,
            Err(ServiceError::InvalidAssociation(_))
        ));
    }
}
