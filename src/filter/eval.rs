use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::Value;

use super::types::{ColumnType, Condition, FilterOp, FilterOrderInfo, SortDirection};
use crate::types::Record;

impl Condition {
    /// True when the row satisfies the condition. Rows whose condition
    /// evaluates to SQL NULL are excluded, as a `WHERE` clause would.
    pub fn matches(&self, record: &Record) -> bool {
        self.evaluate(record) == Some(true)
    }

    /// Three-valued evaluation: `None` is SQL NULL, which survives `NOT`
    pub fn evaluate(&self, record: &Record) -> Option<bool> {
        match self {
            Condition::And(parts) => {
                let mut unknown = false;
                for part in parts {
                    match part.evaluate(record) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown { None } else { Some(true) }
            }
            Condition::Or(parts) => {
                let mut unknown = false;
                for part in parts {
                    match part.evaluate(record) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                if unknown { None } else { Some(false) }
            }
            Condition::Not(inner) => inner.evaluate(record).map(|b| !b),
            Condition::Compare { column, column_type, op, value } => {
                let actual = record.get(column).unwrap_or(&Value::Null);
                compare(actual, *column_type, *op, value)
            }
        }
    }
}

fn compare(actual: &Value, column_type: ColumnType, op: FilterOp, expected: &Value) -> Option<bool> {
    match op {
        FilterOp::Null => Some(actual.is_null() == expected.as_bool().unwrap_or(true)),
        FilterOp::Eq if expected.is_null() => Some(actual.is_null()),
        FilterOp::Ne if expected.is_null() => Some(!actual.is_null()),
        // IS DISTINCT FROM
        FilterOp::Ne => Some(actual.is_null() || order_values(actual, expected, column_type) != Some(Ordering::Equal)),
        _ if actual.is_null() => None,
        FilterOp::Eq => order_values(actual, expected, column_type).map(|o| o == Ordering::Equal),
        FilterOp::Gt => order_values(actual, expected, column_type).map(|o| o == Ordering::Greater),
        FilterOp::Gte => order_values(actual, expected, column_type).map(|o| o != Ordering::Less),
        FilterOp::Lt => order_values(actual, expected, column_type).map(|o| o == Ordering::Less),
        FilterOp::Lte => order_values(actual, expected, column_type).map(|o| o != Ordering::Greater),
        FilterOp::Like => Some(like(expected.as_str()?, actual.as_str()?)),
        FilterOp::ILike => Some(like(&expected.as_str()?.to_lowercase(), &actual.as_str()?.to_lowercase())),
        FilterOp::In | FilterOp::NIn => {
            let found = expected
                .as_array()
                .map(|values| values.iter().any(|v| order_values(actual, v, column_type) == Some(Ordering::Equal)))
                .unwrap_or(false);
            Some(if op == FilterOp::In { found } else { !found })
        }
        FilterOp::Between => match expected.as_array().map(Vec::as_slice) {
            Some([low, high]) => {
                let above = order_values(actual, low, column_type)? != Ordering::Less;
                let below = order_values(actual, high, column_type)? != Ordering::Greater;
                Some(above && below)
            }
            _ => Some(false),
        },
    }
}

/// Order two JSON scalars the way Postgres would order the column type
pub fn order_values(a: &Value, b: &Value, column_type: ColumnType) -> Option<Ordering> {
    match column_type {
        ColumnType::Integer | ColumnType::Decimal => a.as_f64()?.partial_cmp(&b.as_f64()?),
        ColumnType::Boolean => Some(a.as_bool()?.cmp(&b.as_bool()?)),
        ColumnType::Timestamp => {
            let a = DateTime::parse_from_rfc3339(a.as_str()?).ok()?;
            let b = DateTime::parse_from_rfc3339(b.as_str()?).ok()?;
            Some(a.cmp(&b))
        }
        // ISO dates sort lexically
        ColumnType::Text | ColumnType::Date => Some(a.as_str()?.cmp(b.as_str()?)),
    }
}

/// Postgres sorts NULLs last ascending and first descending
pub fn order_records(a: &Record, b: &Record, order: &[FilterOrderInfo]) -> Ordering {
    for info in order {
        let left = a.get(&info.column).unwrap_or(&Value::Null);
        let right = b.get(&info.column).unwrap_or(&Value::Null);
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => order_values(left, right, info.column_type).unwrap_or(Ordering::Equal),
        };
        let ordering = match info.sort {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    Any,
    One,
    Literal(char),
}

/// `%` and `_` are wildcards unless escaped with a backslash
fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            other => LikeToken::Literal(other),
        });
    }
    tokens
}

/// SQL LIKE: `%` matches any run, `_` matches one character
fn like(pattern: &str, text: &str) -> bool {
    let pattern = like_tokens(pattern);
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(LikeToken::One) => {
                p += 1;
                t += 1;
                continue;
            }
            Some(LikeToken::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            Some(LikeToken::Any) => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((bp, bt)) => {
                p = bp + 1;
                t = bt + 1;
                backtrack = Some((bp, bt + 1));
            }
            None => return false,
        }
    }
    pattern[p..].iter().all(|token| *token == LikeToken::Any)
}
