/// Database models for Amari
///
/// Each model is a row struct with its CRUD operations as associated
/// functions taking a `&PgPool` (or any executor, where the operation also
/// runs inside a transaction).
///
/// # Models
///
/// - `user`: accounts and roles
/// - `session`: opaque login sessions
/// - `password_reset`: single-use reset tokens
/// - `vendor_application`: listing applications and the review workflow
/// - `vendor`: public directory listings
/// - `inspiration_post`: gallery posts
/// - `budget_item`: per-couple budget lines
/// - `guest`: per-couple guest list
///
/// # Example
///
/// ```no_run
/// use amari_shared::models::vendor::{Vendor, VendorCategory, VendorFilter};
/// use amari_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let filter = VendorFilter {
///     category: Some(VendorCategory::Photographer),
///     location: Some("Diani".to_string()),
/// };
/// let vendors = Vendor::list(&pool, &filter, 20, 0).await?;
/// # Ok(())
/// # }
/// ```

pub mod budget_item;
pub mod guest;
pub mod inspiration_post;
pub mod password_reset;
pub mod session;
pub mod user;
pub mod vendor;
pub mod vendor_application;
