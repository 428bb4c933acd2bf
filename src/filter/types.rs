use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage type of a filterable column; drives value coercion and SQL casts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Explicit parameter cast so untyped and NULL binds resolve to the column type
    pub fn sql_cast(&self) -> &'static str {
        match self {
            ColumnType::Text => "::text",
            ColumnType::Integer => "::bigint",
            ColumnType::Decimal => "::numeric",
            ColumnType::Boolean => "::boolean",
            ColumnType::Date => "::date",
            ColumnType::Timestamp => "::timestamptz",
        }
    }
}

/// Allow-list of columns a request may select, filter or sort on
#[derive(Debug, Clone, Default)]
pub struct Columns {
    types: BTreeMap<String, ColumnType>,
}

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.insert(name, column_type);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, column_type: ColumnType) {
        self.types.insert(name.into(), column_type);
    }

    pub fn get(&self, name: &str) -> Option<ColumnType> {
        self.types.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Raw filter input as accepted from a JSON body or assembled from a query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: Option<Value>,
    pub order: Option<Value>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,
    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,
    #[serde(rename = "$between")] Between,
    #[serde(rename = "$null")] Null,
}

/// Validated WHERE tree. Every column is known and every value has been
/// coerced to the column's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        column_type: ColumnType,
        op: FilterOp,
        value: Value,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn all() -> Self {
        Condition::And(vec![])
    }

    pub fn eq(column: impl Into<String>, column_type: ColumnType, value: Value) -> Self {
        Condition::Compare {
            column: column.into(),
            column_type,
            op: FilterOp::Eq,
            value,
        }
    }

    /// Conjunction that flattens nested ANDs and drops empty ones
    pub fn and(self, other: Condition) -> Self {
        let mut parts = match self {
            Condition::And(parts) => parts,
            c => vec![c],
        };
        match other {
            Condition::And(more) => parts.extend(more),
            c => parts.push(c),
        }
        Condition::And(parts)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub column_type: ColumnType,
    pub sort: SortDirection,
}

/// Fully validated list query handed to a record store
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Projected columns; empty means every readable column
    pub select: Vec<String>,
    pub condition: Condition,
    pub order: Vec<FilterOrderInfo>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
