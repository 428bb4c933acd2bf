// handlers/protected/mod.rs - handlers behind jwt_auth_middleware
//
// Every handler resolves the resource first (404), then checks the
// permission string (403), and only then reads the request input (400).
pub mod auth;
pub mod data;
