/// Admin endpoints
///
/// Every route here sits behind the session and admin-role middleware.
///
/// - `GET /v1/admin/applications?status=` - Review queue, newest first
/// - `POST /v1/admin/applications/:id/status` - Approve or reject
/// - `GET /v1/admin/stats` - Platform counts
/// - `POST /v1/admin/query` - Allow-listed raw SQL

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Pagination,
};
use amari_shared::{
    auth::session::AuthContext,
    db::admin_query::{self, QueryOutcome},
    models::{
        inspiration_post::InspirationPost,
        user::User,
        vendor::Vendor,
        vendor_application::{ApplicationStatus, ReviewDecision, ReviewOutcome, VendorApplication},
    },
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationsResponse {
    pub applications: Vec<VendorApplication>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// `Approved` or `Rejected`
    pub status: String,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub application: VendorApplication,

    /// The public listing created on approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub users: i64,
    pub vendors: i64,
    pub pending_applications: i64,
    pub posts: i64,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub params: Vec<JsonValue>,
}

/// Query results: `{rows}` for `SELECT`, `{rows_affected}` otherwise
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum QueryResponse {
    Rows { rows: Vec<JsonValue> },
    Affected { rows_affected: u64 },
}

impl From<QueryOutcome> for QueryResponse {
    fn from(outcome: QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Rows(rows) => QueryResponse::Rows { rows },
            QueryOutcome::Affected(rows_affected) => QueryResponse::Affected { rows_affected },
        }
    }
}

fn parse_status(value: &str) -> ApiResult<ApplicationStatus> {
    ApplicationStatus::from_str(value.trim()).ok_or_else(|| {
        ApiError::invalid_field("status", "status must be Pending, Approved or Rejected")
    })
}

pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListApplicationsQuery>,
) -> ApiResult<Json<ApplicationsResponse>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_status)
        .transpose()?;

    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();

    let applications = VendorApplication::list(&state.db, status, limit, offset).await?;
    Ok(Json(ApplicationsResponse { applications }))
}

/// Approve or reject a pending application
///
/// Approval creates the vendor listing and promotes the applicant in the
/// same transaction.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: `status` is not `Approved` or `Rejected`
/// - `404 Not Found`: Application doesn't exist
/// - `409 Conflict`: Application was already reviewed
pub async fn review_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<ReviewResponse>> {
    let status = parse_status(&req.status)?;
    if status == ApplicationStatus::Pending {
        return Err(ApiError::invalid_field(
            "status",
            "status must be Approved or Rejected",
        ));
    }

    let decision = ReviewDecision {
        status,
        admin_notes: req.admin_notes.filter(|n| !n.trim().is_empty()),
        reviewed_by: auth.user_id,
    };

    match VendorApplication::review(&state.db, id, decision).await? {
        ReviewOutcome::Reviewed {
            application,
            vendor,
        } => {
            tracing::info!(
                application_id = %application.id,
                admin_id = %auth.user_id,
                status = status.as_str(),
                vendor_id = ?vendor.as_ref().map(|v| v.id),
                "Vendor application reviewed"
            );
            Ok(Json(ReviewResponse {
                application,
                vendor,
            }))
        }
        ReviewOutcome::NotFound => Err(ApiError::NotFound("Application not found".to_string())),
        ReviewOutcome::InvalidTransition { current } => Err(ApiError::Conflict(format!(
            "Application has already been reviewed (status: {})",
            current
        ))),
    }
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let users = User::count(&state.db).await?;
    let vendors = Vendor::count_all(&state.db).await?;
    let pending_applications =
        VendorApplication::count_by_status(&state.db, ApplicationStatus::Pending).await?;
    let posts = InspirationPost::count(&state.db).await?;

    Ok(Json(StatsResponse {
        users,
        vendors,
        pending_applications,
        posts,
    }))
}

/// Run an allow-listed statement
///
/// # Errors
///
/// - `400 Bad Request`: "Query not allowed", a non-scalar parameter, or a
///   statement the database rejected
pub async fn run_query(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let preview: String = admin_query::normalize_query(&req.query)
        .chars()
        .take(120)
        .collect();

    tracing::warn!(
        admin_id = %auth.user_id,
        params = req.params.len(),
        query = %preview,
        "Admin raw query"
    );

    let outcome = admin_query::execute(&state.db, &req.query, &req.params).await?;
    Ok(Json(outcome.into()))
}
