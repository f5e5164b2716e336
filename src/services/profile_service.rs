use chrono::Utc;
use serde::de::Error as _;
use serde_json::Value;

use crate::auth::{Identity, Session};
use crate::database::directory::UserDirectory;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, ProfileUpdate, User, UserProfile};
use crate::error::ApiError;
use crate::middleware::response::{Acknowledgement, ApiResult};

use super::require_identity;

/// GET /users/me: the session's record, created on first access
pub async fn get_profile(directory: &dyn UserDirectory, session: &Session) -> ApiResult<UserProfile> {
    let identity = require_identity(session)?;

    load_or_create(directory, identity)
        .await
        .map(UserProfile::from)
        .map_err(|e| ApiError::from(e).with_internal_message("Failed to fetch user"))
}

/// PUT /users/me: merge the whitelisted profile fields present in `payload`
pub async fn update_profile(
    directory: &dyn UserDirectory,
    session: &Session,
    payload: &[u8],
) -> ApiResult<Acknowledgement> {
    let identity = require_identity(session)?;

    let update = decode_profile_update(payload).map_err(|e| {
        tracing::warn!("Unreadable profile update from {}: {}", identity.id, e);
        ApiError::internal_server_error("Failed to update profile")
    })?;

    apply_profile_update(directory, identity, &update)
        .await
        .map_err(|e| ApiError::from(e).with_internal_message("Failed to update profile"))?;

    Ok(Acknowledgement::new("Profile updated successfully"))
}

fn decode_profile_update(payload: &[u8]) -> Result<ProfileUpdate, serde_json::Error> {
    let value: Value = serde_json::from_slice(payload)?;
    if !value.is_object() {
        return Err(serde_json::Error::custom("profile update must be a JSON object"));
    }
    serde_json::from_value(value)
}

async fn apply_profile_update(
    directory: &dyn UserDirectory,
    identity: &Identity,
    update: &ProfileUpdate,
) -> Result<(), DatabaseError> {
    if directory.update_profile(&identity.id, update, Utc::now()).await? {
        return Ok(());
    }

    // Nothing to update yet; provision the record the same way a first read would
    load_or_create(directory, identity).await?;
    if directory.update_profile(&identity.id, update, Utc::now()).await? {
        Ok(())
    } else {
        Err(DatabaseError::QueryError(format!(
            "user '{}' missing right after provisioning",
            identity.id
        )))
    }
}

/// Find the record for `identity` or insert a fresh one.
///
/// Two first requests for the same identity may both miss the lookup; the
/// directory's uniqueness constraint rejects the second insert, and the loser
/// re-reads the winner's record.
pub async fn load_or_create(directory: &dyn UserDirectory, identity: &Identity) -> Result<User, DatabaseError> {
    if let Some(user) = directory.find_by_identity(&identity.id).await? {
        return Ok(user);
    }

    let mut new_user = NewUser::new(identity.id.clone(), Utc::now());
    new_user.username = identity.name.clone();
    new_user.email = identity.email.clone();
    new_user.avatar = identity.image.clone();

    match directory.insert(new_user).await {
        Ok(user) => {
            tracing::info!("Created user {} for identity {}", user.id, identity.id);
            Ok(user)
        }
        Err(DatabaseError::Conflict(_)) => {
            tracing::debug!("Concurrent first access for identity {}, re-reading", identity.id);
            directory.find_by_identity(&identity.id).await?.ok_or_else(|| {
                DatabaseError::QueryError(format!(
                    "user '{}' missing after conflicting insert",
                    identity.id
                ))
            })
        }
        Err(e) => Err(e),
    }
}
