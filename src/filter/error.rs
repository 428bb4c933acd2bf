use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Unknown column: {0}")]
    InvalidColumn(String),

    #[error("Invalid WHERE clause: {0}")]
    InvalidWhereClause(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("WHERE clause nested deeper than {0} levels")]
    TooDeep(u32),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
