pub mod profile_service;
pub mod role_service;

use serde::de::DeserializeOwned;

use crate::auth::{Identity, Session};
use crate::error::ApiError;

pub use profile_service::{get_profile, load_or_create, update_profile};
pub use role_service::update_roles;

/// First step of every operation: anonymous sessions stop here
pub fn require_identity(session: &Session) -> Result<&Identity, ApiError> {
    session
        .identity()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
}

/// Decode a JSON request body
pub fn parse_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(payload)?)
}
