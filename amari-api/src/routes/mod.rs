/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check and ping endpoints
/// - `auth`: Registration, login, sessions and password management
/// - `vendors`: Public vendor directory
/// - `applications`: Vendor application submission
/// - `posts`: Inspiration posts
/// - `budget`: Per-user budget items
/// - `guests`: Per-user guest list
/// - `admin`: Application review, stats and raw queries
/// - `concierge`: AI wedding concierge

pub mod admin;
pub mod applications;
pub mod auth;
pub mod budget;
pub mod concierge;
pub mod guests;
pub mod health;
pub mod posts;
pub mod vendors;

use serde::{Deserialize, Deserializer};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?limit=&offset=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Clamped `(limit, offset)`
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        table: Option<Option<i32>>,
    }

    #[test]
    fn test_nullable_field() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.table, None);

        let null: Patch = serde_json::from_str(r#"{"table":null}"#).unwrap();
        assert_eq!(null.table, Some(None));

        let set: Patch = serde_json::from_str(r#"{"table":4}"#).unwrap();
        assert_eq!(set.table, Some(Some(4)));
    }

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(Pagination::default().bounds(), (DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_pagination_clamps() {
        let page = Pagination {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(page.bounds(), (MAX_PAGE_SIZE, 0));

        let page = Pagination {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(page.bounds(), (1, 20));
    }
}
