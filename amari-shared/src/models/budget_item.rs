/// Wedding budget line items
///
/// Each couple keeps their own list of categories with an estimated and an
/// actual amount. Every query is scoped by `user_id`; an item belonging to
/// another user behaves as if it did not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE budget_items (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     category VARCHAR(255) NOT NULL,
///     estimated DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (estimated >= 0),
///     actual DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (actual >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BudgetItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub estimated: f64,
    pub actual: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBudgetItem {
    pub category: String,
    pub estimated: f64,
    pub actual: f64,
}

/// Only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetItem {
    pub category: Option<String>,
    pub estimated: Option<f64>,
    pub actual: Option<f64>,
}

/// Totals over a user's budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_estimated: f64,
    pub total_actual: f64,

    /// `total_estimated - total_actual`; negative when over budget
    pub variance: f64,
}

impl BudgetSummary {
    /// Computes totals over a set of items
    pub fn from_items(items: &[BudgetItem]) -> Self {
        let total_estimated: f64 = items.iter().map(|i| i.estimated).sum();
        let total_actual: f64 = items.iter().map(|i| i.actual).sum();

        Self {
            total_estimated,
            total_actual,
            variance: total_estimated - total_actual,
        }
    }
}

impl BudgetItem {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: CreateBudgetItem,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BudgetItem>(
            r#"
            INSERT INTO budget_items (user_id, category, estimated, actual)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, category, estimated, actual, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(data.category.trim())
        .bind(data.estimated)
        .bind(data.actual)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's items in creation order
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BudgetItem>(
            r#"
            SELECT id, user_id, category, estimated, actual, created_at, updated_at
            FROM budget_items
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Updates an item owned by `user_id`
    ///
    /// Returns `None` if the item doesn't exist or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateBudgetItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        // COALESCE keeps the stored value for absent fields
        sqlx::query_as::<_, BudgetItem>(
            r#"
            UPDATE budget_items
            SET category = COALESCE($3, category),
                estimated = COALESCE($4, estimated),
                actual = COALESCE($5, actual),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, category, estimated, actual, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.category.map(|c| c.trim().to_string()))
        .bind(data.estimated)
        .bind(data.actual)
        .fetch_optional(pool)
        .await
    }

    /// Deletes an item owned by `user_id`
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM budget_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
