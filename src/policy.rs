// policy.rs - Role administration rules
//
// Pure decision functions used by the admin role endpoint. Nothing here touches
// the directory, so every rule can be exercised with plain role lists.

use serde_json::Value;
use thiserror::Error;

use crate::types::{dedup_roles, Role};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Forbidden(String),
}

/// Validate the raw `roles` member of a request body.
///
/// The value must be an array whose elements all name a known [`Role`].
/// Non-string elements count as unknown and are reported by their JSON text.
pub fn parse_proposed_roles(raw: &Value) -> Result<Vec<Role>, PolicyError> {
    let items = raw
        .as_array()
        .ok_or_else(|| PolicyError::InvalidInput("Roles must be an array".to_string()))?;

    let mut roles = Vec::with_capacity(items.len());
    let mut invalid = Vec::new();

    for item in items {
        match item.as_str().map(str::parse::<Role>) {
            Some(Ok(role)) => roles.push(role),
            Some(Err(unknown)) => invalid.push(unknown.0),
            None => invalid.push(item.to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(PolicyError::InvalidInput(format!(
            "Invalid roles: {}",
            invalid.join(", ")
        )));
    }

    Ok(dedup_roles(roles))
}

/// The actor needs admin or founder to use role administration at all.
pub fn authorize_actor(actor_roles: &[Role]) -> Result<(), PolicyError> {
    if actor_roles.iter().any(Role::is_privileged) {
        Ok(())
    } else {
        Err(PolicyError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// Only founders may flip the founder bit on a target.
///
/// Submitting a list that leaves the target's founder status as it is passes,
/// whatever else changes.
pub fn check_founder_guard(
    actor_roles: &[Role],
    target_roles: &[Role],
    proposed: &[Role],
) -> Result<(), PolicyError> {
    if actor_roles.contains(&Role::Founder) {
        return Ok(());
    }

    let target_is_founder = target_roles.contains(&Role::Founder);
    let proposes_founder = proposed.contains(&Role::Founder);

    match (target_is_founder, proposes_founder) {
        (false, true) => Err(PolicyError::Forbidden(
            "Only founders can assign the founder role".to_string(),
        )),
        (true, false) => Err(PolicyError::Forbidden(
            "Only founders can remove the founder role".to_string(),
        )),
        _ => Ok(()),
    }
}
