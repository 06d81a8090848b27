/// Guest list endpoints
///
/// Guests are scoped to the caller; another user's guest answers 404.
///
/// - `GET /v1/guests` - Guests plus RSVP counts
/// - `POST /v1/guests` - Add a guest
/// - `PUT /v1/guests/:id` - Update a guest (`"table_number": null` clears the table)
/// - `DELETE /v1/guests/:id` - Remove a guest

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::nullable,
};
use amari_shared::{
    auth::session::AuthContext,
    models::guest::{CreateGuest, Guest, GuestSummary, RsvpStatus, UpdateGuest},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGuestRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// `Pending` (default), `Confirmed` or `Declined`
    pub rsvp_status: Option<String>,

    #[validate(range(min = 1, message = "Table number must be positive"))]
    pub table_number: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGuestRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,

    pub rsvp_status: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub table_number: Option<Option<i32>>,
}

#[derive(Debug, Serialize)]
pub struct GuestsResponse {
    pub guests: Vec<Guest>,
    pub summary: GuestSummary,
}

fn parse_rsvp(value: &str) -> ApiResult<RsvpStatus> {
    RsvpStatus::from_str(value.trim()).ok_or_else(|| {
        ApiError::invalid_field(
            "rsvp_status",
            "rsvp_status must be Pending, Confirmed or Declined",
        )
    })
}

fn not_found() -> ApiError {
    ApiError::NotFound("Guest not found".to_string())
}

pub async fn list_guests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<GuestsResponse>> {
    let guests = Guest::list_for_user(&state.db, auth.user_id).await?;
    let summary = GuestSummary::from_guests(&guests);

    Ok(Json(GuestsResponse { guests, summary }))
}

pub async fn create_guest(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateGuestRequest>,
) -> ApiResult<(StatusCode, Json<Guest>)> {
    req.validate()?;

    let rsvp_status = req
        .rsvp_status
        .as_deref()
        .map(parse_rsvp)
        .transpose()?
        .unwrap_or_default();

    let guest = Guest::create(
        &state.db,
        auth.user_id,
        CreateGuest {
            name: req.name.trim().to_string(),
            rsvp_status,
            table_number: req.table_number,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(guest)))
}

pub async fn update_guest(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGuestRequest>,
) -> ApiResult<Json<Guest>> {
    req.validate()?;

    if let Some(Some(table)) = req.table_number {
        if table < 1 {
            return Err(ApiError::invalid_field(
                "table_number",
                "Table number must be positive",
            ));
        }
    }

    let update = UpdateGuest {
        name: req.name.map(|n| n.trim().to_string()),
        rsvp_status: req.rsvp_status.as_deref().map(parse_rsvp).transpose()?,
        table_number: req.table_number,
    };

    let guest = Guest::update(&state.db, auth.user_id, id, update)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(guest))
}

pub async fn delete_guest(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Guest::delete(&state.db, auth.user_id, id).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rsvp() {
        assert_eq!(parse_rsvp("Confirmed").unwrap(), RsvpStatus::Confirmed);
        assert!(parse_rsvp("maybe").is_err());
    }

    #[test]
    fn test_update_request_clears_table() {
        let req: UpdateGuestRequest =
            serde_json::from_str(r#"{"table_number":null}"#).unwrap();
        assert_eq!(req.table_number, Some(None));

        let req: UpdateGuestRequest = serde_json::from_str(r#"{"name":"Lucia"}"#).unwrap();
        assert_eq!(req.table_number, None);
    }
}
