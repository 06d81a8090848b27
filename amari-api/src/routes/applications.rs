/// Vendor application endpoints
///
/// - `POST /v1/vendor-applications` - Submit an application (anonymous or signed in)
/// - `GET /v1/vendor-applications/mine` - The caller's own applications
///
/// Review happens under `/v1/admin`.

use crate::{
    app::AppState,
    error::ApiResult,
    routes::vendors::{parse_category, parse_price_range},
};
use amari_shared::{
    auth::session::AuthContext,
    models::vendor_application::{CreateVendorApplication, VendorApplication},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Application form
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitApplicationRequest {
    #[validate(length(min = 1, max = 255, message = "Business name is required"))]
    pub business_name: String,

    /// One of the directory categories
    pub category: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    /// `$$`, `$$$` or `$$$$`
    pub price_range: String,

    #[validate(length(min = 1, max = 255, message = "Location is required"))]
    pub location: String,

    #[validate(email(message = "Invalid email format"))]
    pub contact_email: String,

    #[validate(length(min = 1, max = 50, message = "Contact phone is required"))]
    pub contact_phone: String,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationsResponse {
    pub applications: Vec<VendorApplication>,
}

/// Submit an application
///
/// The session is optional; when present the application is linked to the
/// caller so approval can promote them to `vendor`.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
pub async fn submit_application(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Json(mut req): Json<SubmitApplicationRequest>,
) -> ApiResult<(StatusCode, Json<VendorApplication>)> {
    req.website = req.website.take().filter(|w| !w.trim().is_empty());
    req.validate()?;

    let category = parse_category(&req.category)?;
    let price_range = parse_price_range(&req.price_range)?;
    let user_id = auth.map(|Extension(auth)| auth.user_id);

    let application = VendorApplication::create(
        &state.db,
        CreateVendorApplication {
            user_id,
            business_name: req.business_name.trim().to_string(),
            category,
            description: req.description,
            price_range,
            location: req.location.trim().to_string(),
            contact_email: req.contact_email.trim().to_lowercase(),
            contact_phone: req.contact_phone.trim().to_string(),
            website: req.website,
        },
    )
    .await?;

    tracing::info!(
        application_id = %application.id,
        user_id = ?user_id,
        category = category.as_str(),
        "Vendor application submitted"
    );

    Ok((StatusCode::CREATED, Json(application)))
}

/// The caller's own applications, newest first
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApplicationsResponse>> {
    let applications = VendorApplication::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(ApplicationsResponse { applications }))
}
