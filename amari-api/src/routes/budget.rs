/// Budget planner endpoints
///
/// Items are scoped to the caller; another user's item answers 404.
///
/// - `GET /v1/budget` - Items plus totals
/// - `POST /v1/budget` - Add an item
/// - `PUT /v1/budget/:id` - Update an item
/// - `DELETE /v1/budget/:id` - Remove an item

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use amari_shared::{
    auth::session::AuthContext,
    models::budget_item::{BudgetItem, BudgetSummary, CreateBudgetItem, UpdateBudgetItem},
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
pub struct CreateBudgetItemRequest {
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,

    #[validate(range(min = 0.0, message = "Amounts cannot be negative"))]
    #[serde(default)]
    pub estimated: f64,

    #[validate(range(min = 0.0, message = "Amounts cannot be negative"))]
    #[serde(default)]
    pub actual: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBudgetItemRequest {
    #[validate(length(min = 1, max = 100, message = "Category cannot be empty"))]
    pub category: Option<String>,

    #[validate(range(min = 0.0, message = "Amounts cannot be negative"))]
    pub estimated: Option<f64>,

    #[validate(range(min = 0.0, message = "Amounts cannot be negative"))]
    pub actual: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub items: Vec<BudgetItem>,
    pub summary: BudgetSummary,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Budget item not found".to_string())
}

pub async fn list_items(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BudgetResponse>> {
    let items = BudgetItem::list_for_user(&state.db, auth.user_id).await?;
    let summary = BudgetSummary::from_items(&items);

    Ok(Json(BudgetResponse { items, summary }))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateBudgetItemRequest>,
) -> ApiResult<(StatusCode, Json<BudgetItem>)> {
    req.validate()?;

    let item = BudgetItem::create(
        &state.db,
        auth.user_id,
        CreateBudgetItem {
            category: req.category.trim().to_string(),
            estimated: req.estimated,
            actual: req.actual,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBudgetItemRequest>,
) -> ApiResult<Json<BudgetItem>> {
    req.validate()?;

    let item = BudgetItem::update(
        &state.db,
        auth.user_id,
        id,
        UpdateBudgetItem {
            category: req.category.map(|c| c.trim().to_string()),
            estimated: req.estimated,
            actual: req.actual,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !BudgetItem::delete(&state.db, auth.user_id, id).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amounts_rejected() {
        let req = CreateBudgetItemRequest {
            category: "Flowers".to_string(),
            estimated: -1.0,
            actual: 0.0,
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("estimated"));

        let req = UpdateBudgetItemRequest {
            category: None,
            estimated: None,
            actual: Some(-0.01),
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("actual"));
    }

    #[test]
    fn test_amounts_default_to_zero() {
        let req: CreateBudgetItemRequest =
            serde_json::from_str(r#"{"category":"Venue"}"#).unwrap();
        assert_eq!(req.estimated, 0.0);
        assert_eq!(req.actual, 0.0);
        assert!(req.validate().is_ok());
    }
}
