use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

/// A member record as held by the user directory.
///
/// Deliberately not `Serialize`: responses go through [`UserProfile`], which has
/// no credential field.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub identity_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: String,
    pub website: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    pub roles: Vec<Role>,
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `users` row; roles arrive as text and are narrowed into [`Role`].
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub identity_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: String,
    pub website: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    pub roles: Vec<String>,
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let roles = row
            .roles
            .iter()
            .filter_map(|tag| match tag.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    tracing::warn!("Ignoring stored role on user {}: {}", row.id, e);
                    None
                }
            })
            .collect();

        Self {
            id: row.id,
            identity_id: row.identity_id,
            username: row.username,
            email: row.email,
            avatar: row.avatar,
            bio: row.bio,
            website: row.website,
            github: row.github,
            linkedin: row.linkedin,
            twitter: row.twitter,
            roles,
            password: row.password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields supplied when a member is first seen. The directory assigns `id`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub identity_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Empty profile, default role, timestamps set to `now`
    pub fn new(identity_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identity_id: identity_id.into(),
            username: None,
            email: None,
            avatar: None,
            roles: vec![Role::User],
            created_at: now,
        }
    }
}

/// Self-editable profile fields. Any other key in the payload is dropped
/// during deserialization and cannot reach the directory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(&self, user: &mut User) {
        let fields = [
            (&self.bio, &mut user.bio),
            (&self.website, &mut user.website),
            (&self.github, &mut user.github),
            (&self.linkedin, &mut user.linkedin),
            (&self.twitter, &mut user.twitter),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
    }
}

/// Outbound view of a member, returned by `GET /users/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub identity_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: String,
    pub website: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            identity_id: user.identity_id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            bio: user.bio,
            website: user.website,
            github: user.github,
            linkedin: user.linkedin,
            twitter: user.twitter,
            roles: user.roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
