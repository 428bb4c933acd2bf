use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Columns, Condition, FilterData, FilterOrderInfo, Query, SortDirection};

/// Pagination and nesting bounds applied to every filter
#[derive(Debug, Clone, Copy)]
pub struct FilterLimits {
    pub default_limit: i64,
    pub max_limit: i64,
    pub max_nested_depth: u32,
}

impl FilterLimits {
    pub fn from_config() -> Self {
        let filter = &crate::config::config().filter;
        Self {
            default_limit: filter.default_limit,
            max_limit: filter.max_limit,
            max_nested_depth: filter.max_nested_depth,
        }
    }
}

/// Builder that turns untrusted [`FilterData`] into a validated [`Query`]
/// restricted to one resource's column allow-list.
pub struct Filter<'a> {
    columns: &'a Columns,
    limits: FilterLimits,
    select_columns: Vec<String>,
    condition: Condition,
    order_data: Vec<FilterOrderInfo>,
    limit: i64,
    offset: i64,
}

impl<'a> Filter<'a> {
    pub fn new(columns: &'a Columns) -> Self {
        Self::with_limits(columns, FilterLimits::from_config())
    }

    pub fn with_limits(columns: &'a Columns, limits: FilterLimits) -> Self {
        Self {
            columns,
            limits,
            select_columns: vec![],
            condition: Condition::all(),
            order_data: vec![],
            limit: limits.default_limit,
            offset: 0,
        }
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(&where_clause)?; }
        if let Some(order) = data.order { self.order(&order)?; }
        self.paginate(data.limit, data.offset, data.page)?;
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        if columns.iter().any(|c| c == "*") {
            self.select_columns.clear();
            return Ok(self);
        }
        for column in &columns {
            if !self.columns.contains(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        let mut selected = vec!["id".to_string()];
        for column in columns {
            if !selected.contains(&column) {
                selected.push(column);
            }
        }
        self.select_columns = selected;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: &Value) -> Result<&mut Self, FilterError> {
        let parsed = FilterWhere::new(self.columns, self.limits.max_nested_depth).parse(conditions)?;
        self.and_where(parsed);
        Ok(self)
    }

    /// AND an already validated condition onto the filter
    pub fn and_where(&mut self, condition: Condition) -> &mut Self {
        let current = std::mem::replace(&mut self.condition, Condition::all());
        self.condition = current.and(condition);
        self
    }

    pub fn order(&mut self, order_spec: &Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(order_spec, self.columns)?;
        Ok(self)
    }

    pub fn paginate(&mut self, limit: Option<i64>, offset: Option<i64>, page: Option<i64>) -> Result<&mut Self, FilterError> {
        let limit = limit.unwrap_or(self.limits.default_limit);
        if limit < 1 {
            return Err(FilterError::InvalidLimit("Limit must be at least 1".to_string()));
        }
        let applied_limit = if limit > self.limits.max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, self.limits.max_limit);
            self.limits.max_limit
        } else {
            limit
        };

        let offset = match (offset, page) {
            (Some(_), Some(_)) => {
                return Err(FilterError::InvalidPage("page and offset cannot be combined".to_string()))
            }
            (Some(off), None) if off < 0 => {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()))
            }
            (Some(off), None) => off,
            (None, Some(p)) if p < 1 => return Err(FilterError::InvalidPage("Page numbers start at 1".to_string())),
            (None, Some(p)) => (p - 1).saturating_mul(applied_limit),
            (None, None) => 0,
        };

        self.limit = applied_limit;
        self.offset = offset;
        Ok(self)
    }

    pub fn build(self) -> Query {
        let mut order = self.order_data;
        // Stable pagination needs a unique tiebreaker
        if !order.iter().any(|o| o.column == "id") {
            if let Some(column_type) = self.columns.get("id") {
                order.push(FilterOrderInfo {
                    column: "id".to_string(),
                    column_type,
                    sort: SortDirection::Asc,
                });
            }
        }

        Query {
            select: self.select_columns,
            condition: self.condition,
            order,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
