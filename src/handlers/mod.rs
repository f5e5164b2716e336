// handlers/mod.rs - Route handlers
//
// Every handler receives the `Session` resolved by `session_middleware` and
// hands it to the matching service; none of them reads the token itself.

pub mod admin;
pub mod health;
pub mod users;

pub use admin::update_user_roles;
pub use health::health;
pub use users::{me_get, me_put};

use axum::{body::Bytes, extract::rejection::BytesRejection};

use crate::auth::Session;
use crate::error::ApiError;
use crate::services::require_identity;

/// Unwrap a buffered body; anonymous callers still get 401 when it was rejected
pub(crate) fn read_body(session: &Session, body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    match body {
        Ok(bytes) => Ok(bytes),
        Err(rejection) => {
            require_identity(session)?;
            Err(rejection.into())
        }
    }
}
