/// Guest list entries
///
/// Scoped by `user_id` like budget items.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE guests (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     rsvp_status VARCHAR(20) NOT NULL DEFAULT 'Pending',
///     table_number INTEGER,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RsvpStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Pending => "Pending",
            RsvpStatus::Confirmed => "Confirmed",
            RsvpStatus::Declined => "Declined",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(RsvpStatus::Pending),
            "Confirmed" => Some(RsvpStatus::Confirmed),
            "Declined" => Some(RsvpStatus::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Guest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rsvp_status: String,
    pub table_number: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    pub fn get_rsvp_status(&self) -> Option<RsvpStatus> {
        RsvpStatus::from_str(&self.rsvp_status)
    }
}

#[derive(Debug, Clone)]
pub struct CreateGuest {
    pub name: String,
    pub rsvp_status: RsvpStatus,
    pub table_number: Option<i32>,
}

/// Only `Some` fields are written. Use `Some(None)` to clear the table.
#[derive(Debug, Clone, Default)]
pub struct UpdateGuest {
    pub name: Option<String>,
    pub rsvp_status: Option<RsvpStatus>,
    pub table_number: Option<Option<i32>>,
}

/// RSVP counts over a guest list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSummary {
    pub total: usize,
    pub confirmed: usize,
    pub declined: usize,
    pub pending: usize,
}

impl GuestSummary {
    pub fn from_guests(guests: &[Guest]) -> Self {
        guests.iter().fold(
            Self {
                total: guests.len(),
                ..Default::default()
            },
            |mut summary, guest| {
                match guest.get_rsvp_status() {
                    Some(RsvpStatus::Confirmed) => summary.confirmed += 1,
                    Some(RsvpStatus::Declined) => summary.declined += 1,
                    // unknown stored values count as pending
                    Some(RsvpStatus::Pending) | None => summary.pending += 1,
                }
                summary
            },
        )
    }
}

impl Guest {
    pub async fn create(pool: &PgPool, user_id: Uuid, data: CreateGuest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            r#"
            INSERT INTO guests (user_id, name, rsvp_status, table_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, rsvp_status, table_number, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(data.name.trim())
        .bind(data.rsvp_status.as_str())
        .bind(data.table_number)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's guests by name
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, user_id, name, rsvp_status, table_number, created_at, updated_at
            FROM guests
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Updates a guest owned by `user_id`
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateGuest,
    ) -> Result<Option<Self>, sqlx::Error> {
        // $5 distinguishes "leave table_number alone" from "set it to NULL"
        sqlx::query_as::<_, Guest>(
            r#"
            UPDATE guests
            SET name = COALESCE($3, name),
                rsvp_status = COALESCE($4, rsvp_status),
                table_number = CASE WHEN $5 THEN $6 ELSE table_number END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, rsvp_status, table_number, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.name.map(|n| n.trim().to_string()))
        .bind(data.rsvp_status.map(|s| s.as_str()))
        .bind(data.table_number.is_some())
        .bind(data.table_number.flatten())
        .fetch_optional(pool)
        .await
    }

    /// Deletes a guest owned by `user_id`
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM guests WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
