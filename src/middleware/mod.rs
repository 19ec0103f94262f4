pub mod auth;
pub mod query;
pub mod response;

pub use auth::AuthUser;
pub use query::ListQuery;
pub use response::{ApiResponse, ApiResult};
