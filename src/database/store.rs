use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::filter::Query;
use crate::resources::ResourceDef;
use crate::types::{Actor, Record};

/// Failures surfaced by a [`RecordStore`]. Driver errors are classified so the
/// HTTP layer can tell a broken connection from a rejected statement.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate value: {0}")]
    Conflict(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database unavailable: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepositoryError::Connection(err.to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => RepositoryError::Conflict(db.message().to_string()),
                Some("23503") | Some("23502") | Some("23514") => {
                    RepositoryError::Constraint(db.message().to_string())
                }
                // Class 08 is connection exception, 57P is operator intervention
                Some(code) if code.starts_with("08") || code.starts_with("57P") => {
                    RepositoryError::Connection(db.message().to_string())
                }
                _ => RepositoryError::Database(db.message().to_string()),
            },
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

/// One page of a list query together with the unpaginated match count
#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    pub items: Vec<Record>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Link table that pairs an owner row with target rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpec {
    pub table: &'static str,
    pub owner_key: &'static str,
    pub target_key: &'static str,
}

/// Persistence seam for every resource. All reads and writes are scoped to a
/// tenant and skip soft-deleted rows; returned records never carry `tenant_id`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> RepositoryResult<()>;

    async fn find_many(&self, resource: &ResourceDef, tenant_id: i64, query: &Query) -> RepositoryResult<Page>;

    /// Rows of `resource` linked to `owner_id` through `link`
    async fn find_linked(
        &self,
        resource: &ResourceDef,
        link: LinkSpec,
        tenant_id: i64,
        owner_id: i64,
        query: &Query,
    ) -> RepositoryResult<Page>;

    async fn find_by_id(
        &self,
        resource: &ResourceDef,
        tenant_id: i64,
        id: i64,
        select: &[String],
    ) -> RepositoryResult<Option<Record>>;

    async fn insert(&self, resource: &ResourceDef, actor: Actor, values: Record) -> RepositoryResult<Record>;

    async fn update(
        &self,
        resource: &ResourceDef,
        actor: Actor,
        id: i64,
        values: Record,
    ) -> RepositoryResult<Option<Record>>;

    async fn soft_delete(&self, resource: &ResourceDef, actor: Actor, id: i64) -> RepositoryResult<Option<Record>>;

    /// Returns false when the pair was already linked
    async fn link(&self, link: LinkSpec, actor: Actor, owner_id: i64, target_id: i64) -> RepositoryResult<bool>;

    /// Returns false when there was no such link
    async fn unlink(&self, link: LinkSpec, tenant_id: i64, owner_id: i64, target_id: i64) -> RepositoryResult<bool>;
}

/// Drop columns that never leave the server
pub fn public_record(mut record: Record) -> Record {
    record.remove("tenant_id");
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_driver_errors() {
        assert!(matches!(RepositoryError::from(sqlx::Error::RowNotFound), RepositoryError::NotFound));
        assert!(matches!(RepositoryError::from(sqlx::Error::PoolTimedOut), RepositoryError::Connection(_)));
        assert!(matches!(
            RepositoryError::from(sqlx::Error::Protocol("bad frame".into())),
            RepositoryError::Database(_)
        ));
    }
}
