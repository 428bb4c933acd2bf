use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::store::{public_record, LinkSpec, Page, RecordStore, RepositoryResult};
use crate::filter::eval::order_records;
use crate::filter::Query;
use crate::resources::ResourceDef;
use crate::types::{Actor, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkRow {
    tenant_id: i64,
    owner_id: i64,
    target_id: i64,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Record>>,
    links: HashMap<&'static str, Vec<LinkRow>>,
    sequences: HashMap<String, i64>,
}

impl MemoryState {
    fn next_id(&mut self, table: &str) -> i64 {
        let seq = self.sequences.entry(table.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    fn live(&self, table: &str, tenant_id: i64) -> impl Iterator<Item = &Record> {
        self.tables
            .get(table)
            .into_iter()
            .flatten()
            .filter(move |r| int(r, "tenant_id") == Some(tenant_id) && r.get("deleted_at").map_or(true, Value::is_null))
    }

    fn live_mut(&mut self, table: &str, tenant_id: i64, id: i64) -> Option<&mut Record> {
        self.tables.get_mut(table)?.iter_mut().find(|r| {
            int(r, "id") == Some(id)
                && int(r, "tenant_id") == Some(tenant_id)
                && r.get("deleted_at").map_or(true, Value::is_null)
        })
    }
}

/// Process-local [`RecordStore`] with the same scoping and audit behaviour
/// as the Postgres store. Backs development runs without a database and the
/// integration tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn find_many(&self, resource: &ResourceDef, tenant_id: i64, query: &Query) -> RepositoryResult<Page> {
        let state = self.state.read().await;
        let page = paginate(state.live(resource.table(), tenant_id), query);
        Ok(page)
    }

    async fn find_linked(
        &self,
        resource: &ResourceDef,
        link: LinkSpec,
        tenant_id: i64,
        owner_id: i64,
        query: &Query,
    ) -> RepositoryResult<Page> {
        let state = self.state.read().await;
        let linked: Vec<i64> = state
            .links
            .get(link.table)
            .into_iter()
            .flatten()
            .filter(|l| l.tenant_id == tenant_id && l.owner_id == owner_id)
            .map(|l| l.target_id)
            .collect();
        let rows = state
            .live(resource.table(), tenant_id)
            .filter(|r| int(r, "id").map_or(false, |id| linked.contains(&id)));
        let page = paginate(rows, query);
        Ok(page)
    }

    async fn find_by_id(
        &self,
        resource: &ResourceDef,
        tenant_id: i64,
        id: i64,
        select: &[String],
    ) -> RepositoryResult<Option<Record>> {
        let state = self.state.read().await;
        let record = state
            .live(resource.table(), tenant_id)
            .find(|r| int(r, "id") == Some(id))
            .map(|r| project(r, select));
        Ok(record)
    }

    async fn insert(&self, resource: &ResourceDef, actor: Actor, values: Record) -> RepositoryResult<Record> {
        let mut state = self.state.write().await;
        let id = state.next_id(resource.table());
        let now = Value::String(Utc::now().to_rfc3339());

        let mut record = Record::new();
        record.insert("id".into(), Value::from(id));
        record.insert("tenant_id".into(), Value::from(actor.tenant_id));
        for (name, _) in resource.schema.fields() {
            record.insert(name.to_string(), values.get(name).cloned().unwrap_or(Value::Null));
        }
        record.insert("created_at".into(), now.clone());
        record.insert("updated_at".into(), now);
        record.insert("deleted_at".into(), Value::Null);
        record.insert("created_by".into(), Value::from(actor.user_id));
        record.insert("updated_by".into(), Value::from(actor.user_id));
        record.insert("deleted_by".into(), Value::Null);

        state
            .tables
            .entry(resource.table().to_string())
            .or_default()
            .push(record.clone());
        Ok(public_record(record))
    }

    async fn update(
        &self,
        resource: &ResourceDef,
        actor: Actor,
        id: i64,
        values: Record,
    ) -> RepositoryResult<Option<Record>> {
        let mut state = self.state.write().await;
        let Some(record) = state.live_mut(resource.table(), actor.tenant_id, id) else {
            return Ok(None);
        };
        for (name, value) in values {
            record.insert(name, value);
        }
        record.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        record.insert("updated_by".into(), Value::from(actor.user_id));
        Ok(Some(public_record(record.clone())))
    }

    async fn soft_delete(&self, resource: &ResourceDef, actor: Actor, id: i64) -> RepositoryResult<Option<Record>> {
        let mut state = self.state.write().await;
        let Some(record) = state.live_mut(resource.table(), actor.tenant_id, id) else {
            return Ok(None);
        };
        let now = Value::String(Utc::now().to_rfc3339());
        record.insert("deleted_at".into(), now.clone());
        record.insert("deleted_by".into(), Value::from(actor.user_id));
        record.insert("updated_at".into(), now);
        record.insert("updated_by".into(), Value::from(actor.user_id));
        Ok(Some(public_record(record.clone())))
    }

    async fn link(&self, link: LinkSpec, actor: Actor, owner_id: i64, target_id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.write().await;
        let row = LinkRow {
            tenant_id: actor.tenant_id,
            owner_id,
            target_id,
        };
        let rows = state.links.entry(link.table).or_default();
        if rows.contains(&row) {
            return Ok(false);
        }
        rows.push(row);
        Ok(true)
    }

    async fn unlink(&self, link: LinkSpec, tenant_id: i64, owner_id: i64, target_id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.write().await;
        let Some(rows) = state.links.get_mut(link.table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|l| !(l.tenant_id == tenant_id && l.owner_id == owner_id && l.target_id == target_id));
        Ok(rows.len() < before)
    }
}

fn int(record: &Record, column: &str) -> Option<i64> {
    record.get(column).and_then(Value::as_i64)
}

fn project(record: &Record, select: &[String]) -> Record {
    let record = public_record(record.clone());
    if select.is_empty() {
        return record;
    }
    record.into_iter().filter(|(k, _)| select.contains(k)).collect()
}

fn paginate<'a>(rows: impl Iterator<Item = &'a Record>, query: &Query) -> Page {
    let mut matched: Vec<&Record> = rows.filter(|r| query.condition.matches(r)).collect();
    matched.sort_by(|a, b| order_records(a, b, &query.order));
    let total = matched.len() as i64;
    let items = matched
        .into_iter()
        .skip(query.offset.max(0) as usize)
        .take(query.limit.max(0) as usize)
        .map(|r| project(r, &query.select))
        .collect();
    Page {
        items,
        total,
        limit: query.limit,
        offset: query.offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ColumnType, Condition, FilterOrderInfo, SortDirection};
    use crate::resources::Catalog;
    use serde_json::json;

    fn actor(tenant_id: i64) -> Actor {
        Actor { tenant_id, user_id: 7 }
    }

    fn query(condition: Condition) -> Query {
        Query {
            select: vec![],
            condition,
            order: vec![FilterOrderInfo { column: "id".into(), column_type: ColumnType::Integer, sort: SortDirection::Desc }],
            limit: 10,
            offset: 0,
        }
    }

    fn values(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_fills_audit_columns_and_hides_tenant() {
        let catalog = Catalog::standard();
        let clients = catalog.get("clients").unwrap();
        let store = MemoryStore::new();

        let record = store.insert(clients, actor(1), values(json!({ "name": "Acme" }))).await.unwrap();
        assert_eq!(record["id"], json!(1));
        assert_eq!(record["created_by"], json!(7));
        assert_eq!(record["email"], Value::Null);
        assert!(record.get("tenant_id").is_none());
        assert!(record["created_at"].is_string());
    }

    #[tokio::test]
    async fn reads_are_scoped_by_tenant_and_soft_delete() {
        let catalog = Catalog::standard();
        let clients = catalog.get("clients").unwrap();
        let store = MemoryStore::new();
        store.insert(clients, actor(1), values(json!({ "name": "Acme" }))).await.unwrap();
        store.insert(clients, actor(1), values(json!({ "name": "Globex" }))).await.unwrap();
        store.insert(clients, actor(2), values(json!({ "name": "Initech" }))).await.unwrap();

        let page = store.find_many(clients, 1, &query(Condition::all())).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0]["name"], json!("Globex"));

        assert!(store.find_by_id(clients, 2, 1, &[]).await.unwrap().is_none());
        assert!(store.soft_delete(clients, actor(1), 1).await.unwrap().is_some());
        assert!(store.find_by_id(clients, 1, 1, &[]).await.unwrap().is_none());
        assert!(store.soft_delete(clients, actor(1), 1).await.unwrap().is_none());

        let filtered = store
            .find_many(clients, 1, &query(Condition::eq("name", ColumnType::Text, json!("Acme"))))
            .await
            .unwrap();
        assert_eq!(filtered.total, 0);
    }

    #[tokio::test]
    async fn links_are_unique_per_pair() {
        let catalog = Catalog::standard();
        let roles = catalog.get("roles").unwrap();
        let store = MemoryStore::new();
        let link = LinkSpec { table: "user_roles", owner_key: "user_id", target_key: "role_id" };
        store.insert(roles, actor(1), values(json!({ "name": "admin" }))).await.unwrap();

        assert!(store.link(link, actor(1), 5, 1).await.unwrap());
        assert!(!store.link(link, actor(1), 5, 1).await.unwrap());

        let page = store.find_linked(roles, link, 1, 5, &query(Condition::all())).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(store.find_linked(roles, link, 2, 5, &query(Condition::all())).await.unwrap().total, 0);

        assert!(store.unlink(link, 1, 5, 1).await.unwrap());
        assert!(!store.unlink(link, 1, 5, 1).await.unwrap());
    }
}
