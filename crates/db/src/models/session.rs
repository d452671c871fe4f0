//! Server-side login sessions. Access tokens reference a session by id so
//! that signing out takes effect before the token expires.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const SESSION_COLUMNS: &str = "id, user_id, created_at, expires_at, last_used_at, revoked_at";

pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, ttl: Duration) -> Result<Session, SessionError> {
        let now = Utc::now();
        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (id, user_id, created_at, expires_at, last_used_at) \
             VALUES ($1, $2, $3, $4, $3) \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(now)
        .bind(now + ttl)
        .fetch_one(self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Result<Session, SessionError> {
        sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(SessionError::NotFound)
    }

    pub async fn touch(&self, id: Uuid) -> Result<(), SessionError> {
        sqlx::query("UPDATE sessions SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Mark the session revoked. Revoking twice keeps the first timestamp.
    pub async fn revoke(&self, id: Uuid) -> Result<(), SessionError> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = COALESCE(revoked_at, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SessionError::NotFound);
        }
        Ok(())
    }
}
