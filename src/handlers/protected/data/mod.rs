pub mod association;
pub mod collection;
pub mod record;
pub mod utils;
