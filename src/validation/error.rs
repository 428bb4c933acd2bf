use std::collections::BTreeMap;

use thiserror::Error;

use crate::filter::FilterError;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Request body must contain at least one field")]
    Empty,

    #[error("Invalid fields: {}", summarize(.0))]
    Fields(BTreeMap<String, String>),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl ValidationError {
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.into(), message.into());
        ValidationError::Fields(fields)
    }
}

fn summarize(fields: &BTreeMap<String, String>) -> String {
    fields.keys().cloned().collect::<Vec<_>>().join(", ")
}
