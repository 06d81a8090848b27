/// Login sessions
///
/// A session maps the SHA-256 digest of an opaque bearer token to a user and
/// an expiry. The plaintext token is only ever held by the client.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     ip_address VARCHAR(64),
///     user_agent TEXT
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::auth::token::{generate_token, hash_token};

/// Session row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,

    #[serde(skip_serializing)]
    pub token_hash: String,

    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Input for creating a session
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub ttl: Duration,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Session joined with the identity of its user
///
/// Returned by [`Session::find_valid`]; only produced for unexpired sessions
/// of active users.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionIdentity {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub user_type: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session and returns it with the plaintext token
    ///
    /// The token is not recoverable after this call.
    pub async fn create(pool: &PgPool, data: CreateSession) -> Result<(Self, String), sqlx::Error> {
        let token = generate_token();
        let expires_at = Utc::now() + data.ttl;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token_hash, expires_at, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_hash, expires_at, created_at, ip_address, user_agent
            "#,
        )
        .bind(data.user_id)
        .bind(&token.hash)
        .bind(expires_at)
        .bind(data.ip_address)
        .bind(data.user_agent)
        .fetch_one(pool)
        .await?;

        Ok((session, token.plaintext))
    }

    /// Resolves a plaintext token to a live session identity
    ///
    /// Returns `None` when the token is unknown, expired, or belongs to a
    /// deactivated user.
    pub async fn find_valid(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<SessionIdentity>, sqlx::Error> {
        sqlx::query_as::<_, SessionIdentity>(
            r#"
            SELECT s.id AS session_id, u.id AS user_id, u.email, u.user_type, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1
              AND s.expires_at > NOW()
              AND u.is_active = TRUE
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(pool)
        .await
    }

    /// Deletes a single session
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every session of a user
    ///
    /// Runs after password changes and resets.
    pub async fn delete_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Removes sessions whose expiry has passed
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

}
