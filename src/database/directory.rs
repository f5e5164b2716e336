use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, ProfileUpdate, User};
use crate::types::Role;

/// Abstraction over member persistence.
///
/// Implementations must enforce uniqueness of `identity_id`: a second `insert`
/// for an identity that already has a record fails with
/// [`DatabaseError::Conflict`] and leaves the first record untouched.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Create a record and return it with its store-assigned id
    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Replace the role set. Returns `false` when no record has this id.
    async fn update_roles(
        &self,
        id: Uuid,
        roles: &[Role],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;

    /// Merge the present profile fields. Returns `false` when no record matches.
    async fn update_profile(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
