/// Vendor applications and the admin review workflow
///
/// Businesses apply to be listed; an admin approves or rejects. Approval
/// creates the public [`Vendor`] row and promotes the applicant to the vendor
/// role in the same transaction.
///
/// # State Machine
///
/// ```text
/// Pending ──▶ Approved
///    │
///    └──────▶ Rejected
/// ```
///
/// Reviewed applications are final.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE vendor_applications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     business_name VARCHAR(255) NOT NULL,
///     category VARCHAR(50) NOT NULL,
///     description TEXT NOT NULL,
///     price_range VARCHAR(4) NOT NULL,
///     location VARCHAR(255) NOT NULL,
///     contact_email VARCHAR(255) NOT NULL,
///     contact_phone VARCHAR(50) NOT NULL,
///     website TEXT,
///     status VARCHAR(20) NOT NULL DEFAULT 'Pending',
///     admin_notes TEXT,
///     submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     reviewed_at TIMESTAMPTZ,
///     reviewed_by UUID REFERENCES users(id) ON DELETE SET NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;
use super::vendor::{CreateVendor, PriceRange, Vendor, VendorCategory};

const APPLICATION_COLUMNS: &str = "id, user_id, business_name, category, description, price_range, \
     location, contact_email, contact_phone, website, status, admin_notes, submitted_at, \
     reviewed_at, reviewed_by";

/// Review state of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(ApplicationStatus::Pending),
            "Approved" => Some(ApplicationStatus::Approved),
            "Rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    /// Checks if a review can move an application from this status to `target`
    pub fn can_transition_to(&self, target: ApplicationStatus) -> bool {
        matches!(
            (self, target),
            (ApplicationStatus::Pending, ApplicationStatus::Approved)
                | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
        )
    }
}

/// Vendor application row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VendorApplication {
    pub id: Uuid,

    /// Applicant, when submitted with a session
    pub user_id: Option<Uuid>,

    pub business_name: String,
    pub category: String,
    pub description: String,
    pub price_range: String,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub website: Option<String>,
    pub status: String,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

impl VendorApplication {
    /// Gets the parsed status
    pub fn get_status(&self) -> Option<ApplicationStatus> {
        ApplicationStatus::from_str(&self.status)
    }
}

/// Input for submitting an application
#[derive(Debug, Clone)]
pub struct CreateVendorApplication {
    pub user_id: Option<Uuid>,
    pub business_name: String,
    pub category: VendorCategory,
    pub description: String,
    pub price_range: PriceRange,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub website: Option<String>,
}

/// Admin decision on an application
#[derive(Debug, Clone)]
pub struct ReviewDecision {
    pub status: ApplicationStatus,
    pub admin_notes: Option<String>,
    pub reviewed_by: Uuid,
}

/// Outcome of [`VendorApplication::review`]
#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    /// Application was updated; `vendor` is set on approval
    Reviewed {
        application: VendorApplication,
        vendor: Option<Vendor>,
    },

    /// No application with this ID
    NotFound,

    /// Application is not in a status that can take this decision
    InvalidTransition { current: String },
}

impl VendorApplication {
    /// Submits a new application with status `Pending`
    pub async fn create(pool: &PgPool, data: CreateVendorApplication) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO vendor_applications (
                user_id, business_name, category, description, price_range,
                location, contact_email, contact_phone, website
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );

        sqlx::query_as::<_, VendorApplication>(&query)
            .bind(data.user_id)
            .bind(data.business_name.trim())
            .bind(data.category.as_str())
            .bind(data.description)
            .bind(data.price_range.as_str())
            .bind(data.location.trim())
            .bind(data.contact_email.trim().to_lowercase())
            .bind(data.contact_phone.trim())
            .bind(data.website)
            .fetch_one(pool)
            .await
    }

    /// Finds an application by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM vendor_applications WHERE id = $1",
            APPLICATION_COLUMNS
        );

        sqlx::query_as::<_, VendorApplication>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists applications, newest first, optionally filtered by status
    pub async fn list(
        pool: &PgPool,
        status: Option<ApplicationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {} FROM vendor_applications WHERE status = $1 \
                     ORDER BY submitted_at DESC LIMIT $2 OFFSET $3",
                    APPLICATION_COLUMNS
                );
                sqlx::query_as::<_, VendorApplication>(&query)
                    .bind(status.as_str())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {} FROM vendor_applications \
                     ORDER BY submitted_at DESC LIMIT $1 OFFSET $2",
                    APPLICATION_COLUMNS
                );
                sqlx::query_as::<_, VendorApplication>(&query)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Lists a user's own applications, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM vendor_applications WHERE user_id = $1 ORDER BY submitted_at DESC",
            APPLICATION_COLUMNS
        );

        sqlx::query_as::<_, VendorApplication>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Counts applications with a given status
    pub async fn count_by_status(
        pool: &PgPool,
        status: ApplicationStatus,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM vendor_applications WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Applies an admin decision
    ///
    /// The application row is locked for the duration of the transaction so
    /// two concurrent reviews cannot both succeed. On approval the vendor
    /// listing is created from the application and the applicant, if it is
    /// a couple account, becomes a vendor.
    pub async fn review(
        pool: &PgPool,
        id: Uuid,
        decision: ReviewDecision,
    ) -> Result<ReviewOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!(
            "SELECT {} FROM vendor_applications WHERE id = $1 FOR UPDATE",
            APPLICATION_COLUMNS
        );
        let Some(current) = sqlx::query_as::<_, VendorApplication>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(ReviewOutcome::NotFound);
        };

        let allowed = current
            .get_status()
            .map(|s| s.can_transition_to(decision.status))
            .unwrap_or(false);
        if !allowed {
            tx.rollback().await?;
            return Ok(ReviewOutcome::InvalidTransition {
                current: current.status,
            });
        }

        let update = format!(
            r#"
            UPDATE vendor_applications
            SET status = $2, admin_notes = $3, reviewed_at = NOW(), reviewed_by = $4
            WHERE id = $1
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let application = sqlx::query_as::<_, VendorApplication>(&update)
            .bind(id)
            .bind(decision.status.as_str())
            .bind(decision.admin_notes)
            .bind(decision.reviewed_by)
            .fetch_one(&mut *tx)
            .await?;

        let vendor = if decision.status == ApplicationStatus::Approved {
            let vendor = Vendor::create(&mut *tx, application.to_create_vendor()).await?;

            if let Some(user_id) = application.user_id {
                User::promote_to_vendor(&mut *tx, user_id).await?;
            }

            Some(vendor)
        } else {
            None
        };

        tx.commit().await?;

        Ok(ReviewOutcome::Reviewed {
            application,
            vendor,
        })
    }

    /// Projects the application onto a new vendor listing
    fn to_create_vendor(&self) -> CreateVendor {
        CreateVendor {
            user_id: self.user_id,
            application_id: Some(self.id),
            name: self.business_name.clone(),
            category: VendorCategory::from_str(&self.category).unwrap_or(VendorCategory::Venue),
            price_range: PriceRange::from_str(&self.price_range).unwrap_or(PriceRange::Premium),
            description: self.description.clone(),
            image_url: None,
            location: self.location.clone(),
            contact_email: Some(self.contact_email.clone()),
            contact_phone: Some(self.contact_phone.clone()),
        }
    }
}
