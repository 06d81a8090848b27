/// Password reset requests
///
/// # Schema
///
/// ```sql
/// CREATE TABLE password_resets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     used BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::token::{generate_token, hash_token};
use crate::models::session::Session;
use crate::models::user::User;

/// Password reset row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,

    #[serde(skip_serializing)]
    pub token_hash: String,

    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used: bool,
}

impl PasswordReset {
    /// Creates a reset record and returns it with the plaintext token
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<(Self, String), sqlx::Error> {
        let token = generate_token();
        let expires_at = Utc::now() + ttl;

        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO password_resets (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, created_at, used
            "#,
        )
        .bind(user_id)
        .bind(&token.hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok((reset, token.plaintext))
    }

    /// Redeems a token and sets the new password hash
    ///
    /// In one transaction: claims the record (only if still unused and
    /// unexpired), replaces the password hash, and deletes every session of
    /// the user. Returns the user id, or `None` if the token is not
    /// redeemable. Two concurrent redemptions cannot both succeed because the
    /// claim is a conditional `UPDATE`.
    pub async fn redeem(
        pool: &PgPool,
        token: &str,
        new_password_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE password_resets
            SET used = TRUE
            WHERE token_hash = $1 AND used = FALSE AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&mut *tx)
        .await?;

        let Some((user_id,)) = claimed else {
            tx.rollback().await?;
            return Ok(None);
        };

        User::set_password_hash(&mut *tx, user_id, new_password_hash).await?;
        Session::delete_for_user(&mut *tx, user_id).await?;

        tx.commit().await?;

        Ok(Some(user_id))
    }

    /// Removes used or expired records
    pub async fn purge_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM password_resets WHERE used = TRUE OR expires_at <= NOW()")
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }
}
