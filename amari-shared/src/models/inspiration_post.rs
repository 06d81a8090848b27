/// Inspiration posts shown on the public gallery
///
/// # Schema
///
/// ```sql
/// CREATE TABLE inspiration_posts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     author_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(255) NOT NULL,
///     body TEXT NOT NULL,
///     image_url TEXT,
///     location VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InspirationPost {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateInspirationPost {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub location: Option<String>,
}

impl InspirationPost {
    pub async fn create(pool: &PgPool, data: CreateInspirationPost) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, InspirationPost>(
            r#"
            INSERT INTO inspiration_posts (author_id, title, body, image_url, location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, author_id, title, body, image_url, location, created_at
            "#,
        )
        .bind(data.author_id)
        .bind(data.title.trim())
        .bind(data.body)
        .bind(data.image_url)
        .bind(data.location)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InspirationPost>(
            r#"
            SELECT id, author_id, title, body, image_url, location, created_at
            FROM inspiration_posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists posts newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, InspirationPost>(
            r#"
            SELECT id, author_id, title, body, image_url, location, created_at
            FROM inspiration_posts
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inspiration_posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM inspiration_posts")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
