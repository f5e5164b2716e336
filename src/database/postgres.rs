use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::directory::UserDirectory;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, ProfileUpdate, User, UserRow};
use crate::types::Role;

/// Schema for the `users` table. `identity_id` is `UNIQUE`; create-on-first-read
/// depends on it to turn a concurrent duplicate insert into a conflict.
pub const USERS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        identity_id TEXT NOT NULL,
        username    TEXT,
        email       TEXT,
        avatar      TEXT,
        bio         TEXT NOT NULL DEFAULT '',
        website     TEXT NOT NULL DEFAULT '',
        github      TEXT NOT NULL DEFAULT '',
        linkedin    TEXT NOT NULL DEFAULT '',
        twitter     TEXT NOT NULL DEFAULT '',
        roles       TEXT[] NOT NULL DEFAULT '{}',
        password    TEXT,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        CONSTRAINT users_identity_id_key UNIQUE (identity_id)
    )
"#;

const USER_COLUMNS: &str = "id, identity_id, username, email, avatar, bio, website, github, \
     linkedin, twitter, roles, password, created_at, updated_at";

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(USERS_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn role_tags(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

#[async_trait::async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE identity_id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(identity_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (identity_id, username, email, avatar, roles, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             ON CONFLICT (identity_id) DO NOTHING
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.identity_id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.avatar)
            .bind(role_tags(&user.roles))
            .bind(user.created_at)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::from).ok_or_else(|| {
            DatabaseError::Conflict(format!(
                "user with identity '{}' already exists",
                user.identity_id
            ))
        })
    }

    async fn update_roles(
        &self,
        id: Uuid,
        roles: &[Role],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET roles = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(role_tags(roles))
            .bind(updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET
                bio = COALESCE($2, bio),
                website = COALESCE($3, website),
                github = COALESCE($4, github),
                linkedin = COALESCE($5, linkedin),
                twitter = COALESCE($6, twitter),
                updated_at = $7
             WHERE identity_id = $1",
        )
        .bind(identity_id)
        .bind(&update.bio)
        .bind(&update.website)
        .bind(&update.github)
        .bind(&update.linkedin)
        .bind(&update.twitter)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
