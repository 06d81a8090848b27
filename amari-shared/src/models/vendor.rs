/// Vendor model and database operations
///
/// A vendor is the public listing shown in the directory. Rows are created
/// when an admin approves a [`VendorApplication`](super::vendor_application::VendorApplication),
/// and afterwards edited by the owning vendor user or an admin.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE vendors (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     application_id UUID REFERENCES vendor_applications(id) ON DELETE SET NULL,
///     name VARCHAR(255) NOT NULL,
///     category VARCHAR(50) NOT NULL,
///     rating DOUBLE PRECISION NOT NULL DEFAULT 0,
///     price_range VARCHAR(4) NOT NULL,
///     description TEXT NOT NULL,
///     image_url TEXT,
///     location VARCHAR(255) NOT NULL,
///     contact_email VARCHAR(255),
///     contact_phone VARCHAR(50),
///     approved_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const VENDOR_COLUMNS: &str = "id, user_id, application_id, name, category, rating, price_range, \
     description, image_url, location, contact_email, contact_phone, approved_at, created_at";

/// Directory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorCategory {
    Venue,
    Planner,
    Photographer,
    Caterer,
    Stylist,
    Transport,
}

impl VendorCategory {
    pub const ALL: [VendorCategory; 6] = [
        VendorCategory::Venue,
        VendorCategory::Planner,
        VendorCategory::Photographer,
        VendorCategory::Caterer,
        VendorCategory::Stylist,
        VendorCategory::Transport,
    ];

    /// Converts category to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorCategory::Venue => "Venue",
            VendorCategory::Planner => "Planner",
            VendorCategory::Photographer => "Photographer",
            VendorCategory::Caterer => "Caterer",
            VendorCategory::Stylist => "Stylist",
            VendorCategory::Transport => "Transport",
        }
    }

    /// Parses category from string
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Price tier shown on a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "$$")]
    Moderate,

    #[serde(rename = "$$$")]
    Premium,

    #[serde(rename = "$$$$")]
    Luxury,
}

impl PriceRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Moderate => "$$",
            PriceRange::Premium => "$$$",
            PriceRange::Luxury => "$$$$",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "$$" => Some(PriceRange::Moderate),
            "$$$" => Some(PriceRange::Premium),
            "$$$$" => Some(PriceRange::Luxury),
            _ => None,
        }
    }
}

/// Public vendor listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vendor {
    pub id: Uuid,

    /// Vendor user managing the listing, if any
    pub user_id: Option<Uuid>,

    /// Application this listing was approved from
    pub application_id: Option<Uuid>,

    pub name: String,
    pub category: String,

    /// Average rating in `[0.0, 5.0]`
    pub rating: f64,

    pub price_range: String,
    pub description: String,
    pub image_url: Option<String>,
    pub location: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a vendor listing
#[derive(Debug, Clone)]
pub struct CreateVendor {
    pub user_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub name: String,
    pub category: VendorCategory,
    pub price_range: PriceRange,
    pub description: String,
    pub image_url: Option<String>,
    pub location: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Listing fields editable after approval
///
/// Only `Some` fields are written. Use `Some(None)` to clear an optional field.
#[derive(Debug, Clone, Default)]
pub struct UpdateVendor {
    pub name: Option<String>,
    pub category: Option<VendorCategory>,
    pub price_range: Option<PriceRange>,
    pub description: Option<String>,
    pub image_url: Option<Option<String>>,
    pub location: Option<String>,
    pub contact_email: Option<Option<String>>,
    pub contact_phone: Option<Option<String>>,
}

impl UpdateVendor {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price_range.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.location.is_none()
            && self.contact_email.is_none()
            && self.contact_phone.is_none()
    }
}

/// Directory filter
#[derive(Debug, Clone, Default)]
pub struct VendorFilter {
    pub category: Option<VendorCategory>,

    /// Case-insensitive substring match on location
    pub location: Option<String>,
}

impl VendorFilter {
    /// Builds the WHERE clause, numbering binds from `$1`
    fn where_clause(&self) -> (String, usize) {
        let mut conditions = Vec::new();
        let mut bind_count = 0;

        if self.category.is_some() {
            bind_count += 1;
            conditions.push(format!("category = ${}", bind_count));
        }
        if self.location.is_some() {
            bind_count += 1;
            conditions.push(format!("location ILIKE ${} ESCAPE '\\'", bind_count));
        }

        if conditions.is_empty() {
            (String::new(), bind_count)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), bind_count)
        }
    }

    /// Substring pattern with `\`, `%` and `_` matched literally
    fn location_pattern(&self) -> Option<String> {
        self.location.as_ref().map(|l| {
            let escaped = l
                .trim()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }
}

impl Vendor {
    /// Creates a vendor listing
    ///
    /// Takes any executor so approval can create the listing inside its
    /// transaction.
    pub async fn create<'e, E>(executor: E, data: CreateVendor) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO vendors (
                user_id, application_id, name, category, rating, price_range,
                description, image_url, location, contact_email, contact_phone, approved_at
            )
            VALUES ($1, $2, $3, $4, 0.0, $5, $6, $7, $8, $9, $10, NOW())
            RETURNING {}
            "#,
            VENDOR_COLUMNS
        );

        sqlx::query_as::<_, Vendor>(&query)
            .bind(data.user_id)
            .bind(data.application_id)
            .bind(data.name)
            .bind(data.category.as_str())
            .bind(data.price_range.as_str())
            .bind(data.description)
            .bind(data.image_url)
            .bind(data.location)
            .bind(data.contact_email)
            .bind(data.contact_phone)
            .fetch_one(executor)
            .await
    }

    /// Finds a vendor by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM vendors WHERE id = $1", VENDOR_COLUMNS);

        sqlx::query_as::<_, Vendor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists vendors matching `filter`, best rated first
    pub async fn list(
        pool: &PgPool,
        filter: &VendorFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (where_clause, bind_count) = filter.where_clause();
        let query = format!(
            "SELECT {} FROM vendors {} ORDER BY rating DESC, name ASC LIMIT ${} OFFSET ${}",
            VENDOR_COLUMNS,
            where_clause,
            bind_count + 1,
            bind_count + 2
        );

        let mut q = sqlx::query_as::<_, Vendor>(&query);
        if let Some(category) = filter.category {
            q = q.bind(category.as_str());
        }
        if let Some(pattern) = filter.location_pattern() {
            q = q.bind(pattern);
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Counts vendors matching `filter`
    pub async fn count(pool: &PgPool, filter: &VendorFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, _) = filter.where_clause();
        let query = format!("SELECT COUNT(*) FROM vendors {}", where_clause);

        let mut q = sqlx::query_as::<_, (i64,)>(&query);
        if let Some(category) = filter.category {
            q = q.bind(category.as_str());
        }
        if let Some(pattern) = filter.location_pattern() {
            q = q.bind(pattern);
        }

        let (count,) = q.fetch_one(pool).await?;
        Ok(count)
    }

    /// Updates a vendor listing
    ///
    /// Returns the updated vendor, or `None` if it doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateVendor,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut sets = Vec::new();
        let mut bind_count = 1;

        let mut push = |column: &str, present: bool| {
            if present {
                bind_count += 1;
                sets.push(format!("{} = ${}", column, bind_count));
            }
        };
        push("name", data.name.is_some());
        push("category", data.category.is_some());
        push("price_range", data.price_range.is_some());
        push("description", data.description.is_some());
        push("image_url", data.image_url.is_some());
        push("location", data.location.is_some());
        push("contact_email", data.contact_email.is_some());
        push("contact_phone", data.contact_phone.is_some());

        let query = format!(
            "UPDATE vendors SET {} WHERE id = $1 RETURNING {}",
            sets.join(", "),
            VENDOR_COLUMNS
        );

        let mut q = sqlx::query_as::<_, Vendor>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(category) = data.category {
            q = q.bind(category.as_str());
        }
        if let Some(price_range) = data.price_range {
            q = q.bind(price_range.as_str());
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }
        if let Some(location) = data.location {
            q = q.bind(location);
        }
        if let Some(contact_email) = data.contact_email {
            q = q.bind(contact_email);
        }
        if let Some(contact_phone) = data.contact_phone {
            q = q.bind(contact_phone);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a vendor by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all vendors
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        Self::count(pool, &VendorFilter::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in VendorCategory::ALL {
            assert_eq!(VendorCategory::from_str(category.as_str()), Some(category));
        }
        assert_eq!(VendorCategory::from_str("venue"), None);
        assert_eq!(VendorCategory::from_str("Florist"), None);
    }

    #[test]
    fn test_price_range_serde() {
        assert_eq!(serde_json::to_string(&PriceRange::Luxury).unwrap(), "\"$$$$\"");
        let parsed: PriceRange = serde_json::from_str("\"$$\"").unwrap();
        assert_eq!(parsed, PriceRange::Moderate);
        assert!(serde_json::from_str::<PriceRange>("\"$\"").is_err());
        assert_eq!(PriceRange::from_str("$$$"), Some(PriceRange::Premium));
    }

    #[test]
    fn test_filter_where_clause() {
        let (clause, binds) = VendorFilter::default().where_clause();
        assert_eq!(clause, "");
        assert_eq!(binds, 0);

        let filter = VendorFilter {
            category: Some(VendorCategory::Venue),
            location: Some(" Diani ".to_string()),
        };
        let (clause, binds) = filter.where_clause();
        assert_eq!(clause, "WHERE category = $1 AND location ILIKE $2 ESCAPE '\\'");
        assert_eq!(binds, 2);
        assert_eq!(filter.location_pattern().as_deref(), Some("%Diani%"));

        let filter = VendorFilter {
            category: None,
            location: Some("100%_beach\\".to_string()),
        };
        assert_eq!(
            filter.location_pattern().as_deref(),
            Some("%100\\%\\_beach\\\\%")
        );

        let filter = VendorFilter {
            category: None,
            location: Some("Watamu".to_string()),
        };
        assert_eq!(filter.where_clause().0, "WHERE location ILIKE $1 ESCAPE '\\'");
    }

    #[test]
    fn test_update_vendor_is_empty() {
        assert!(UpdateVendor::default().is_empty());
        let update = UpdateVendor {
            image_url: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
