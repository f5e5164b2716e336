// handlers/users/me.rs - GET/PUT /users/me handlers

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::Session;
use crate::handlers::read_body;
use crate::database::models::UserProfile;
use crate::middleware::response::{Acknowledgement, ApiResult};
use crate::services::profile_service;

/// GET /users/me - Current member's record, created on first access
pub async fn me_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<UserProfile>> {
    profile_service::get_profile(state.directory.as_ref(), &session)
        .await
        .map(Json)
}

/// PUT /users/me - Update the current member's profile
///
/// Expected Input (all optional, other keys ignored):
/// ```json
/// { "bio": "", "website": "", "github": "", "linkedin": "", "twitter": "" }
/// ```
pub async fn me_put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Acknowledgement> {
    let body = read_body(&session, body)?;
    profile_service::update_profile(state.directory.as_ref(), &session, &body).await
}
