//! Request validation: declarative field schemas for write bodies and the
//! list-option parser that feeds the filter DSL.

pub mod error;
pub mod field;
pub mod list_query;
pub mod schema;

pub use error::ValidationError;
pub use field::{Field, FieldKind};
pub use list_query::filter_data_from_params;
pub use schema::Schema;
