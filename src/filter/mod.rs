pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod sql;
pub mod eval;
pub mod error;

pub use error::FilterError;
pub use filter::{Filter, FilterLimits};
pub use types::*;
