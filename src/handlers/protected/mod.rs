// handlers/protected/mod.rs - handlers that require a bearer token
//
// Every handler here takes `AuthUser` as its first extractor: a missing or
// invalid token is answered with 401 before the body is read or any store
// is touched.

pub mod categories;
pub mod materials;
pub mod products;
pub mod upload;
