/// User model and database operations
///
/// Users are couples planning a wedding, vendors managing a listing, or
/// platform admins. Emails are stored lowercased and trimmed so lookups are
/// case-insensitive.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     first_name VARCHAR(255) NOT NULL,
///     last_name VARCHAR(255) NOT NULL,
///     phone VARCHAR(50),
///     user_type VARCHAR(20) NOT NULL DEFAULT 'couple',
///     password_hash TEXT NOT NULL,
///     profile_image TEXT,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use amari_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "Wanjiru@Example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "Wanjiru".to_string(),
///     last_name: "Otieno".to_string(),
///     phone: None,
///     role: UserRole::Couple,
/// }).await?;
///
/// assert_eq!(user.email, "wanjiru@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, user_type, password_hash, \
     profile_image, email_verified, is_active, created_at, last_login";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Couple planning a wedding
    Couple,

    /// Vendor managing a public listing
    Vendor,

    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Converts role to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Couple => "couple",
            UserRole::Vendor => "vendor",
            UserRole::Admin => "admin",
        }
    }

    /// Parses role from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "couple" => Some(UserRole::Couple),
            "vendor" => Some(UserRole::Vendor),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Normalizes an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User account row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Lowercased email, unique across users
    pub email: String,

    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,

    /// Stored role name; see [`User::role`]
    pub user_type: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub profile_image: Option<String>,
    pub email_verified: bool,

    /// Inactive users cannot log in and their sessions stop resolving
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Gets the parsed role
    ///
    /// Unknown stored values degrade to the least privileged role.
    pub fn role(&self) -> UserRole {
        UserRole::from_str(&self.user_type).unwrap_or(UserRole::Couple)
    }

    /// Whether the user is a platform admin
    pub fn is_admin(&self) -> bool {
        self.role() == UserRole::Admin
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (normalized before insert)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Profile fields a user may change themselves
///
/// Only `Some` fields are written. Use `Some(None)` to clear an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub profile_image: Option<Option<String>>,
}

impl UpdateProfile {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.profile_image.is_none()
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error on duplicate email (`users_email_key`)
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, phone, user_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.first_name.trim())
            .bind(data.last_name.trim())
            .bind(data.phone)
            .bind(data.role.as_str())
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active user by email
    ///
    /// This is the lookup used by login and password reset: deactivated
    /// accounts are indistinguishable from unknown ones.
    pub async fn find_active_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 AND is_active = TRUE LIMIT 1",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Applies a profile update
    ///
    /// Returns the updated user, or `None` if the user doesn't exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        // Build dynamic update query based on which fields are present
        let mut sets = Vec::new();
        let mut bind_count = 1;

        if data.first_name.is_some() {
            bind_count += 1;
            sets.push(format!("first_name = ${}", bind_count));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            sets.push(format!("last_name = ${}", bind_count));
        }
        if data.phone.is_some() {
            bind_count += 1;
            sets.push(format!("phone = ${}", bind_count));
        }
        if data.profile_image.is_some() {
            bind_count += 1;
            sets.push(format!("profile_image = ${}", bind_count));
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING {}",
            sets.join(", "),
            USER_COLUMNS
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(first_name) = data.first_name {
            q = q.bind(first_name.trim().to_string());
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name.trim().to_string());
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }
        if let Some(profile_image) = data.profile_image {
            q = q.bind(profile_image);
        }

        q.fetch_optional(pool).await
    }

    /// Replaces the password hash
    ///
    /// Takes any executor so it can run inside the reset transaction.
    pub async fn set_password_hash<'e, E>(
        executor: E,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Makes a couple account a vendor
    ///
    /// Vendor and admin accounts are left as they are. Returns whether the
    /// role changed.
    pub async fn promote_to_vendor<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE users SET user_type = $2 WHERE id = $1 AND user_type = $3")
            .bind(id)
            .bind(UserRole::Vendor.as_str())
            .bind(UserRole::Couple.as_str())
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the last login timestamp
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Creates or promotes the bootstrap admin account
    ///
    /// An existing account with this email gets the admin role and the new
    /// password hash; otherwise a fresh admin is inserted.
    pub async fn upsert_admin(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, user_type, email_verified)
            VALUES ($1, $2, 'Amari', 'Admin', 'admin', TRUE)
            ON CONFLICT (email) DO UPDATE
                SET user_type = 'admin',
                    password_hash = EXCLUDED.password_hash,
                    is_active = TRUE
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .bind(password_hash)
            .fetch_one(pool)
            .await
    }

    /// Deletes a user by ID
    ///
    /// Sessions, resets, budget items and guests cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
