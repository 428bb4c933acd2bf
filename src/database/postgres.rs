use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Row};
use tracing::debug;

use super::store::{public_record, LinkSpec, Page, RecordStore, RepositoryError, RepositoryResult};
use crate::filter::sql::{
    count_sql, insert_sql, link_sql, select_sql, soft_delete_sql, unlink_sql, update_sql, LinkedBy, Scope, TypedValue,
};
use crate::filter::{ColumnType, Query, SqlResult};
use crate::resources::ResourceDef;
use crate::types::{Actor, Record};

/// [`RecordStore`] over a Postgres pool. Rows come back as `row_to_json`
/// objects so one code path serves every resource table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_records(&self, sql: &SqlResult) -> RepositoryResult<Vec<Record>> {
        debug!(query = %sql.query, params = sql.params.len(), "select");
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_param(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_record).collect()
    }

    async fn fetch_count(&self, sql: &SqlResult) -> RepositoryResult<i64> {
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_param(query, param);
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn fetch_optional(&self, sql: &SqlResult) -> RepositoryResult<Option<Record>> {
        debug!(query = %sql.query, params = sql.params.len(), "write");
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_param(query, param);
        }
        match query.fetch_optional(&self.pool).await? {
            Some(row) => row_record(&row).map(Some),
            None => Ok(None),
        }
    }

    /// Run a statement, returning the number of rows it touched
    async fn execute(&self, sql: &SqlResult) -> RepositoryResult<u64> {
        debug!(query = %sql.query, params = sql.params.len(), "execute");
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_param(query, param);
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    async fn page(&self, table: &str, scope: &Scope<'_>, query: &Query) -> RepositoryResult<Page> {
        let items = self.fetch_records(&select_sql(table, scope, query)).await?;
        let total = self.fetch_count(&count_sql(table, scope, &query.condition)).await?;
        Ok(Page {
            items,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }
}

#[async_trait]
impl RecordStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_many(&self, resource: &ResourceDef, tenant_id: i64, query: &Query) -> RepositoryResult<Page> {
        self.page(resource.table(), &Scope::tenant(tenant_id), query).await
    }

    async fn find_linked(
        &self,
        resource: &ResourceDef,
        link: LinkSpec,
        tenant_id: i64,
        owner_id: i64,
        query: &Query,
    ) -> RepositoryResult<Page> {
        let scope = Scope::linked(tenant_id, linked_by(link, owner_id));
        self.page(resource.table(), &scope, query).await
    }

    async fn find_by_id(
        &self,
        resource: &ResourceDef,
        tenant_id: i64,
        id: i64,
        select: &[String],
    ) -> RepositoryResult<Option<Record>> {
        let query = Query {
            select: select.to_vec(),
            condition: crate::filter::Condition::eq("id", ColumnType::Integer, Value::from(id)),
            order: vec![],
            limit: 1,
            offset: 0,
        };
        let mut records = self
            .fetch_records(&select_sql(resource.table(), &Scope::tenant(tenant_id), &query))
            .await?;
        Ok(records.pop())
    }

    async fn insert(&self, resource: &ResourceDef, actor: Actor, values: Record) -> RepositoryResult<Record> {
        let values = typed_values(resource, values)?;
        let sql = insert_sql(resource.table(), actor.tenant_id, actor.user_id, values);
        self.fetch_optional(&sql).await?.ok_or(RepositoryError::NotFound)
    }

    async fn update(
        &self,
        resource: &ResourceDef,
        actor: Actor,
        id: i64,
        values: Record,
    ) -> RepositoryResult<Option<Record>> {
        let values = typed_values(resource, values)?;
        let sql = update_sql(resource.table(), actor.tenant_id, actor.user_id, id, values);
        self.fetch_optional(&sql).await
    }

    async fn soft_delete(&self, resource: &ResourceDef, actor: Actor, id: i64) -> RepositoryResult<Option<Record>> {
        let sql = soft_delete_sql(resource.table(), actor.tenant_id, actor.user_id, id);
        self.fetch_optional(&sql).await
    }

    async fn link(&self, link: LinkSpec, actor: Actor, owner_id: i64, target_id: i64) -> RepositoryResult<bool> {
        let sql = link_sql(&linked_by(link, owner_id), actor.tenant_id, actor.user_id, target_id);
        Ok(self.execute(&sql).await? > 0)
    }

    async fn unlink(&self, link: LinkSpec, tenant_id: i64, owner_id: i64, target_id: i64) -> RepositoryResult<bool> {
        let sql = unlink_sql(&linked_by(link, owner_id), tenant_id, target_id);
        Ok(self.execute(&sql).await? > 0)
    }
}

fn linked_by(link: LinkSpec, owner_id: i64) -> LinkedBy<'static> {
    LinkedBy {
        link_table: link.table,
        owner_key: link.owner_key,
        target_key: link.target_key,
        owner_id,
    }
}

/// Attach each writable column's storage type
fn typed_values(resource: &ResourceDef, values: Record) -> RepositoryResult<Vec<TypedValue>> {
    values
        .into_iter()
        .map(|(name, value)| -> RepositoryResult<TypedValue> {
            let column_type = column_type(resource, &name)?;
            Ok((name, column_type, value))
        })
        .collect()
}

fn column_type(resource: &ResourceDef, name: &str) -> RepositoryResult<ColumnType> {
    resource
        .schema
        .get(name)
        .map(|field| field.column_type())
        .ok_or_else(|| RepositoryError::Database(format!("{} has no writable column {}", resource.name, name)))
}

fn row_record(row: &sqlx::postgres::PgRow) -> RepositoryResult<Record> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(record) => Ok(public_record(record)),
        other => Err(RepositoryError::Database(format!("expected a JSON object row, got {}", other))),
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // Arrays are expanded into individual placeholders by SqlWriter
        Value::Array(_) | Value::Object(_) => q.bind(v.to_string()),
    }
}
