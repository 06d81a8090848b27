/// Inspiration post endpoints
///
/// - `GET /v1/posts` - Newest first, paginated
/// - `POST /v1/posts` - Publish a post (session)
/// - `DELETE /v1/posts/:id` - Remove a post (author or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Pagination,
};
use amari_shared::{
    auth::{authorization::require_owner_or_admin, session::AuthContext},
    models::inspiration_post::{CreateInspirationPost, InspirationPost},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,

    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<InspirationPost>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<PostsResponse>> {
    let (limit, offset) = page.bounds();
    let posts = InspirationPost::list(&state.db, limit, offset).await?;

    Ok(Json(PostsResponse { posts }))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<InspirationPost>)> {
    req.validate()?;

    let post = InspirationPost::create(
        &state.db,
        CreateInspirationPost {
            author_id: auth.user_id,
            title: req.title,
            body: req.body,
            image_url: req.image_url.filter(|v| !v.trim().is_empty()),
            location: req.location.filter(|v| !v.trim().is_empty()),
        },
    )
    .await?;

    tracing::info!(post_id = %post.id, author_id = %auth.user_id, "Inspiration post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// Remove a post
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither the author nor an admin
/// - `404 Not Found`: Post doesn't exist
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let post = InspirationPost::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    require_owner_or_admin(&auth, post.author_id)?;

    InspirationPost::delete(&state.db, id).await?;

    tracing::info!(post_id = %id, user_id = %auth.user_id, "Inspiration post deleted");

    Ok(StatusCode::NO_CONTENT)
}
