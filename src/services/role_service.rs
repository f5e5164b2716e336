use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::Session;
use crate::database::directory::UserDirectory;
use crate::error::ApiError;
use crate::middleware::response::{Acknowledgement, ApiResult};
use crate::policy::{self, PolicyError};

use super::{parse_payload, require_identity};

/// Replace the role set of user `target_id` on behalf of the session's member.
///
/// Order of checks: session, payload shape and vocabulary (no store access yet),
/// actor lookup and base authorization, target lookup, founder guard. Exactly
/// one directory write happens, and only when every check passed.
pub async fn update_roles(
    directory: &dyn UserDirectory,
    session: &Session,
    target_id: &str,
    payload: &[u8],
) -> ApiResult<Acknowledgement> {
    apply_role_update(directory, session, target_id, payload)
        .await
        .map_err(|e| e.with_internal_message("Failed to update user roles"))
}

async fn apply_role_update(
    directory: &dyn UserDirectory,
    session: &Session,
    target_id: &str,
    payload: &[u8],
) -> ApiResult<Acknowledgement> {
    let identity = require_identity(session)?;

    // Anything but an object carrying `roles` leaves the member missing
    let body: Value = parse_payload(payload)?;
    let proposed = policy::parse_proposed_roles(body.get("roles").unwrap_or(&Value::Null))?;

    let actor = directory
        .find_by_identity(&identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    policy::authorize_actor(&actor.roles).map_err(|e| deny(&actor.identity_id, target_id, e))?;

    // A malformed id cannot name any record
    let target = match Uuid::parse_str(target_id) {
        Ok(id) => directory.find_by_id(id).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    policy::check_founder_guard(&actor.roles, &target.roles, &proposed)
        .map_err(|e| deny(&actor.identity_id, target_id, e))?;

    if !directory.update_roles(target.id, &proposed, Utc::now()).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(
        "User {} set roles of {} to {:?}",
        actor.identity_id,
        target.id,
        proposed
    );

    Ok(Acknowledgement::new("User roles updated successfully"))
}

fn deny(actor: &str, target_id: &str, err: PolicyError) -> ApiError {
    tracing::warn!("Role update on {} by {} denied: {}", target_id, actor, err);
    err.into()
}
