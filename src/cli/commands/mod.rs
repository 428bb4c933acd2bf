pub mod migrate;
pub mod ping;
pub mod resources;
pub mod token;
