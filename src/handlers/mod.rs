// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (bearer JWT, permission string per route)
pub mod protected;
pub mod public;
