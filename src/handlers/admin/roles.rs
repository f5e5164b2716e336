// handlers/admin/roles.rs - PUT /admin/users/:id/roles handler

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    Extension,
};

use crate::app::AppState;
use crate::auth::Session;
use crate::handlers::read_body;
use crate::middleware::response::{Acknowledgement, ApiResult};
use crate::services::role_service;

/// PUT /admin/users/:id/roles - Replace a member's role set
///
/// Expected Input:
/// ```json
/// { "roles": ["admin", "founder"] }
/// ```
///
/// The body is read raw so an anonymous caller gets 401 even when the payload
/// is malformed.
pub async fn update_user_roles(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Acknowledgement> {
    let body = read_body(&session, body)?;
    role_service::update_roles(state.directory.as_ref(), &session, &id, &body).await
}
