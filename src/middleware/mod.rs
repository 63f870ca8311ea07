pub mod auth;
pub mod extract;
pub mod request_log;
pub mod response;

pub use auth::{jwt_auth_middleware, AdminAccess, ReadAccess};
pub use extract::{Params, ValidatedJson, ValidatedQuery};
pub use request_log::request_log_middleware;
pub use response::{ApiResponse, ApiResult};
