/// Vendor directory endpoints
///
/// - `GET /v1/vendors` - List approved vendors, best rated first
/// - `GET /v1/vendors/:id` - Vendor detail
/// - `PUT /v1/vendors/:id` - Edit a listing (owning vendor or admin)
/// - `DELETE /v1/vendors/:id` - Remove a listing (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Pagination,
};
use amari_shared::{
    auth::{
        authorization::{require_admin, require_owner_or_admin},
        session::AuthContext,
    },
    models::vendor::{PriceRange, UpdateVendor, Vendor, VendorCategory, VendorFilter},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListVendorsQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListVendorsResponse {
    pub vendors: Vec<Vendor>,
    pub total: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVendorRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_range: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Location cannot be empty"))]
    pub location: Option<String>,

    /// Empty strings clear the optional contact fields
    pub image_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Parses a `category` value, 422 when unknown
pub(crate) fn parse_category(value: &str) -> ApiResult<VendorCategory> {
    VendorCategory::from_str(value.trim()).ok_or_else(|| {
        ApiError::invalid_field(
            "category",
            "category must be one of Venue, Planner, Photographer, Caterer, Stylist, Transport",
        )
    })
}

/// Parses a `price_range` value, 422 when unknown
pub(crate) fn parse_price_range(value: &str) -> ApiResult<PriceRange> {
    PriceRange::from_str(value.trim()).ok_or_else(|| {
        ApiError::invalid_field("price_range", "price_range must be one of $$, $$$, $$$$")
    })
}

fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
}

/// List vendors
///
/// # Endpoint
///
/// ```text
/// GET /v1/vendors?category=Venue&location=tulum&limit=20&offset=0
/// ```
///
/// `location` is a case-insensitive substring match.
pub async fn list_vendors(
    State(state): State<AppState>,
    Query(query): Query<ListVendorsQuery>,
) -> ApiResult<Json<ListVendorsResponse>> {
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(parse_category)
        .transpose()?;

    let filter = VendorFilter {
        category,
        location: query.location.filter(|l| !l.trim().is_empty()),
    };
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();

    let vendors = Vendor::list(&state.db, &filter, limit, offset).await?;
    let total = Vendor::count(&state.db, &filter).await?;

    Ok(Json(ListVendorsResponse { vendors, total }))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vendor>> {
    let vendor = Vendor::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vendor not found".to_string()))?;

    Ok(Json(vendor))
}

/// Edit a listing
///
/// # Errors
///
/// - `403 Forbidden`: Caller neither owns the listing nor is an admin
/// - `404 Not Found`: Vendor doesn't exist
pub async fn update_vendor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVendorRequest>,
) -> ApiResult<Json<Vendor>> {
    req.validate()?;

    let vendor = Vendor::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vendor not found".to_string()))?;

    require_owner_or_admin(&auth, vendor.user_id)?;

    let update = UpdateVendor {
        name: req.name.map(|v| v.trim().to_string()),
        category: req.category.as_deref().map(parse_category).transpose()?,
        price_range: req.price_range.as_deref().map(parse_price_range).transpose()?,
        description: req.description,
        image_url: clearable(req.image_url),
        location: req.location.map(|v| v.trim().to_string()),
        contact_email: clearable(req.contact_email),
        contact_phone: clearable(req.contact_phone),
    };

    let vendor = Vendor::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vendor not found".to_string()))?;

    tracing::info!(vendor_id = %vendor.id, user_id = %auth.user_id, "Vendor listing updated");

    Ok(Json(vendor))
}

/// Remove a listing (admin only)
pub async fn delete_vendor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !Vendor::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Vendor not found".to_string()));
    }

    tracing::info!(vendor_id = %id, admin_id = %auth.user_id, "Vendor deleted");

    Ok(StatusCode::NO_CONTENT)
}
