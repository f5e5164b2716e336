pub mod auth;
pub mod response;

pub use auth::session_middleware;
pub use response::{panic_response, Acknowledgement, ApiResult};
