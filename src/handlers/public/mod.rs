// handlers/public/mod.rs - handlers reachable without a token
//
// Route prefix: /api (catalog reads and auth), plus / and /health.

pub mod auth;
pub mod categories;
pub mod materials;
pub mod products;
pub mod system;
