use serde_json::Value;

use super::filter_order::FilterOrder;
use super::types::{ColumnType, Condition, FilterOp, Query, SqlResult};

/// Renders validated [`Condition`] trees into Postgres SQL with positional
/// parameters. Column names come from the allow-list, values are always bound.
#[derive(Debug, Default)]
pub struct SqlWriter {
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return its placeholder with a cast for the column type
    pub fn param(&mut self, value: Value, column_type: ColumnType) -> String {
        self.params.push(value);
        format!("${}{}", self.params.len(), column_type.sql_cast())
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    pub fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::And(parts) if parts.is_empty() => "1=1".to_string(),
            Condition::Or(parts) if parts.is_empty() => "1=0".to_string(),
            Condition::And(parts) => self.join(parts, " AND "),
            Condition::Or(parts) => self.join(parts, " OR "),
            Condition::Not(inner) => format!("NOT ({})", self.condition(inner)),
            Condition::Compare { column, column_type, op, value } => self.compare(column, *column_type, *op, value),
        }
    }

    fn join(&mut self, parts: &[Condition], joiner: &str) -> String {
        let sql: Vec<String> = parts.iter().map(|p| format!("({})", self.condition(p))).collect();
        sql.join(joiner)
    }

    fn compare(&mut self, column: &str, column_type: ColumnType, op: FilterOp, value: &Value) -> String {
        let quoted_column = format!("\"{}\"", column);
        match op {
            FilterOp::Eq if value.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Ne if value.is_null() => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::Ne => format!("{} IS DISTINCT FROM {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::Like => format!("{} LIKE {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.param(value.clone(), column_type)),
            FilterOp::In | FilterOp::NIn => {
                let values = value.as_array().cloned().unwrap_or_default();
                if values.is_empty() {
                    return if op == FilterOp::In { "1=0".to_string() } else { "1=1".to_string() };
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v, column_type)).collect();
                let keyword = if op == FilterOp::In { "IN" } else { "NOT IN" };
                format!("{} {} ({})", quoted_column, keyword, params.join(", "))
            }
            FilterOp::Between => {
                let values = value.as_array().cloned().unwrap_or_default();
                let low = self.param(values.first().cloned().unwrap_or(Value::Null), column_type);
                let high = self.param(values.get(1).cloned().unwrap_or(Value::Null), column_type);
                format!("{} BETWEEN {} AND {}", quoted_column, low, high)
            }
            FilterOp::Null => {
                if value.as_bool().unwrap_or(true) {
                    format!("{} IS NULL", quoted_column)
                } else {
                    format!("{} IS NOT NULL", quoted_column)
                }
            }
        }
    }
}

/// Restricts a statement to one tenant's live rows, optionally only those
/// reachable from an owner row through a link table.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub tenant_id: i64,
    pub linked: Option<LinkedBy<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct LinkedBy<'a> {
    pub link_table: &'a str,
    pub owner_key: &'a str,
    pub target_key: &'a str,
    pub owner_id: i64,
}

impl<'a> Scope<'a> {
    pub fn tenant(tenant_id: i64) -> Self {
        Self { tenant_id, linked: None }
    }

    pub fn linked(tenant_id: i64, linked: LinkedBy<'a>) -> Self {
        Self { tenant_id, linked: Some(linked) }
    }

    fn render(&self, writer: &mut SqlWriter) -> String {
        let tenant = writer.param(Value::from(self.tenant_id), ColumnType::Integer);
        let mut sql = format!("\"tenant_id\" = {} AND \"deleted_at\" IS NULL", tenant);
        if let Some(link) = self.linked {
            let owner = writer.param(Value::from(link.owner_id), ColumnType::Integer);
            sql.push_str(&format!(
                " AND \"id\" IN (SELECT \"{}\" FROM \"{}\" WHERE \"{}\" = {} AND \"tenant_id\" = {})",
                link.target_key, link.link_table, link.owner_key, owner, tenant
            ));
        }
        sql
    }
}

fn projection(select: &[String]) -> String {
    if select.is_empty() {
        "*".to_string()
    } else {
        select.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
    }
}

/// `SELECT` returning one JSON object per row in a `row` column
pub fn select_sql(table: &str, scope: &Scope, query: &Query) -> SqlResult {
    let mut writer = SqlWriter::new();
    let scope = scope.render(&mut writer);
    let condition = writer.condition(&query.condition);
    let order_clause = FilterOrder::generate(&query.order);

    let inner = [
        format!("SELECT {}", projection(&query.select)),
        format!("FROM \"{}\"", table),
        format!("WHERE {} AND ({})", scope, condition),
        order_clause,
        format!("LIMIT {} OFFSET {}", query.limit, query.offset),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    SqlResult {
        query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner),
        params: writer.into_params(),
    }
}

pub fn count_sql(table: &str, scope: &Scope, condition: &Condition) -> SqlResult {
    let mut writer = SqlWriter::new();
    let scope = scope.render(&mut writer);
    let condition = writer.condition(condition);
    SqlResult {
        query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {} AND ({})", table, scope, condition),
        params: writer.into_params(),
    }
}

/// Writable column with its storage type and the value to store
pub type TypedValue = (String, ColumnType, Value);

fn live_row(writer: &mut SqlWriter, tenant_id: i64, id: i64) -> String {
    let id = writer.param(Value::from(id), ColumnType::Integer);
    let tenant = writer.param(Value::from(tenant_id), ColumnType::Integer);
    format!("\"id\" = {} AND \"tenant_id\" = {} AND \"deleted_at\" IS NULL", id, tenant)
}

/// `INSERT` stamping tenant and creator, returning the new row as JSON
pub fn insert_sql(table: &str, tenant_id: i64, user_id: i64, values: Vec<TypedValue>) -> SqlResult {
    let mut writer = SqlWriter::new();
    let mut columns = vec!["\"tenant_id\"".to_string(), "\"created_by\"".to_string(), "\"updated_by\"".to_string()];
    let tenant = writer.param(Value::from(tenant_id), ColumnType::Integer);
    let user = writer.param(Value::from(user_id), ColumnType::Integer);
    let mut placeholders = vec![tenant, user.clone(), user];

    for (name, column_type, value) in values {
        columns.push(format!("\"{}\"", name));
        placeholders.push(writer.param(value, column_type));
    }

    SqlResult {
        query: format!(
            "WITH ins AS (INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *) \
             SELECT row_to_json(ins) AS row FROM ins",
            table,
            columns.join(", "),
            placeholders.join(", ")
        ),
        params: writer.into_params(),
    }
}

/// Partial `UPDATE` of one live row; no row comes back when it is missing
pub fn update_sql(table: &str, tenant_id: i64, user_id: i64, id: i64, values: Vec<TypedValue>) -> SqlResult {
    let mut writer = SqlWriter::new();
    let mut assignments = Vec::with_capacity(values.len() + 2);
    for (name, column_type, value) in values {
        assignments.push(format!("\"{}\" = {}", name, writer.param(value, column_type)));
    }
    assignments.push("\"updated_at\" = now()".to_string());
    assignments.push(format!(
        "\"updated_by\" = {}",
        writer.param(Value::from(user_id), ColumnType::Integer)
    ));
    let target = live_row(&mut writer, tenant_id, id);

    SqlResult {
        query: format!(
            "WITH upd AS (UPDATE \"{}\" SET {} WHERE {} RETURNING *) \
             SELECT row_to_json(upd) AS row FROM upd",
            table,
            assignments.join(", "),
            target
        ),
        params: writer.into_params(),
    }
}

/// Stamp `deleted_at`/`deleted_by` on one live row
pub fn soft_delete_sql(table: &str, tenant_id: i64, user_id: i64, id: i64) -> SqlResult {
    let mut writer = SqlWriter::new();
    let user = writer.param(Value::from(user_id), ColumnType::Integer);
    let target = live_row(&mut writer, tenant_id, id);

    SqlResult {
        query: format!(
            "WITH del AS (UPDATE \"{}\" SET \"deleted_at\" = now(), \"deleted_by\" = {}, \
             \"updated_at\" = now(), \"updated_by\" = {} WHERE {} RETURNING *) \
             SELECT row_to_json(del) AS row FROM del",
            table, user, user, target
        ),
        params: writer.into_params(),
    }
}

/// Insert a link row; an existing pair affects no rows
pub fn link_sql(link: &LinkedBy, tenant_id: i64, user_id: i64, target_id: i64) -> SqlResult {
    let mut writer = SqlWriter::new();
    let tenant = writer.param(Value::from(tenant_id), ColumnType::Integer);
    let owner = writer.param(Value::from(link.owner_id), ColumnType::Integer);
    let target = writer.param(Value::from(target_id), ColumnType::Integer);
    let user = writer.param(Value::from(user_id), ColumnType::Integer);

    SqlResult {
        query: format!(
            "INSERT INTO \"{}\" (\"tenant_id\", \"{}\", \"{}\", \"created_by\") VALUES ({}, {}, {}, {}) \
             ON CONFLICT DO NOTHING",
            link.link_table, link.owner_key, link.target_key, tenant, owner, target, user
        ),
        params: writer.into_params(),
    }
}

pub fn unlink_sql(link: &LinkedBy, tenant_id: i64, target_id: i64) -> SqlResult {
    let mut writer = SqlWriter::new();
    let tenant = writer.param(Value::from(tenant_id), ColumnType::Integer);
    let owner = writer.param(Value::from(link.owner_id), ColumnType::Integer);
    let target = writer.param(Value::from(target_id), ColumnType::Integer);

    SqlResult {
        query: format!(
            "DELETE FROM \"{}\" WHERE \"tenant_id\" = {} AND \"{}\" = {} AND \"{}\" = {}",
            link.link_table, tenant, link.owner_key, owner, link.target_key, target
        ),
        params: writer.into_params(),
    }
}
