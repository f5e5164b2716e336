use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::directory::UserDirectory;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, ProfileUpdate, User};
use crate::types::Role;

/// Process-local directory keyed by internal id with an identity index.
///
/// Used when no database is configured and by the test suites. Read and write
/// counters let callers assert how often the store was touched.
#[derive(Default)]
pub struct MemoryUserDirectory {
    inner: RwLock<Inner>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    by_identity: HashMap<String, Uuid>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lookups served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of insert / update calls so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, DatabaseError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().await;
        Ok(inner
            .by_identity
            .get(identity_id)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write().await;

        if inner.by_identity.contains_key(&user.identity_id) {
            return Err(DatabaseError::Conflict(format!(
                "user with identity '{}' already exists",
                user.identity_id
            )));
        }

        let record = User {
            id: Uuid::new_v4(),
            identity_id: user.identity_id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            bio: String::new(),
            website: String::new(),
            github: String::new(),
            linkedin: String::new(),
            twitter: String::new(),
            roles: user.roles,
            password: None,
            created_at: user.created_at,
            updated_at: user.created_at,
        };

        inner.by_identity.insert(record.identity_id.clone(), record.id);
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_roles(
        &self,
        id: Uuid,
        roles: &[Role],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.roles = roles.to_vec();
                user.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write().await;
        let Some(id) = inner.by_identity.get(identity_id).copied() else {
            return Ok(false);
        };
        match inner.users.get_mut(&id) {
            Some(user) => {
                update.apply_to(user);
                user.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
