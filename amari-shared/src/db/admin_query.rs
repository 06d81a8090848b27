/// Allow-listed raw SQL for the admin console
///
/// Admins can run ad-hoc CRUD statements against content tables. Statements
/// are screened by [`is_query_allowed`] before they reach the database:
/// schema changes, role management, catalog access, and any statement
/// touching credentials are refused.
///
/// `SELECT` results come back as JSON objects, one per row. Other statements
/// report the number of affected rows.
///
/// # Example
///
/// ```no_run
/// use amari_shared::db::admin_query::{execute, QueryOutcome};
/// use serde_json::json;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = execute(
///     &pool,
///     "SELECT name, rating FROM vendors WHERE category = $1",
///     &[json!("Venue")],
/// ).await?;
///
/// if let QueryOutcome::Rows(rows) = outcome {
///     println!("{} venues", rows.len());
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, Either, Executor, PgPool, Statement, TypeInfo};
use std::str::FromStr;
use uuid::Uuid;

/// Substrings that reject a statement outright
const FORBIDDEN: &[&str] = &[
    "drop ",
    "truncate ",
    "grant ",
    "revoke ",
    "alter role",
    "create role",
    "pg_",
    "information_schema",
    "create table",
    "alter table",
];

/// Substrings that would expose credentials
const SENSITIVE: &[&str] = &[
    "password_hash",
    "password_resets",
    "from sessions",
    "into sessions",
    "from users",
];

const ALLOWED_VERBS: &[&str] = &["select", "insert", "update", "delete"];

/// Error type for admin query execution
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Statement failed the allow-list
    #[error("Query not allowed")]
    NotAllowed,

    /// A parameter was an array or object
    #[error("Parameter {0} must be a JSON scalar")]
    UnsupportedParam(usize),

    /// A parameter could not be read as its placeholder's type
    #[error("Parameter {position} is not a valid {expected}")]
    InvalidParam { position: usize, expected: String },

    /// Statement failed in the database
    #[error("Query execution failed: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result of an admin statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    /// Rows of a `SELECT`, as JSON objects
    Rows(Vec<JsonValue>),

    /// Row count of an `INSERT`, `UPDATE` or `DELETE`
    Affected(u64),
}

/// Trims whitespace and trailing semicolons
pub fn normalize_query(query: &str) -> &str {
    query.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Checks a statement against the allow-list
pub fn is_query_allowed(query: &str) -> bool {
    let q = normalize_query(query).to_lowercase();

    if FORBIDDEN.iter().any(|k| q.contains(k)) {
        return false;
    }

    if SENSITIVE.iter().any(|k| q.contains(k)) {
        return false;
    }

    ALLOWED_VERBS.iter().any(|verb| q.starts_with(verb))
}

fn is_select(query: &str) -> bool {
    query.to_lowercase().starts_with("select")
}

fn check_params(params: &[JsonValue]) -> Result<(), QueryError> {
    match params
        .iter()
        .position(|p| matches!(p, JsonValue::Array(_) | JsonValue::Object(_)))
    {
        Some(index) => Err(QueryError::UnsupportedParam(index + 1)),
        None => Ok(()),
    }
}

/// Decodes a scalar into `T`, treating JSON `null` as SQL `NULL`
fn scalar<T>(
    param: &JsonValue,
    decode: impl FnOnce(&JsonValue) -> Option<T>,
) -> Option<Option<T>> {
    match param {
        JsonValue::Null => Some(None),
        other => decode(other).map(Some),
    }
}

fn parse_str<T: FromStr>(value: &JsonValue) -> Option<T> {
    value.as_str().and_then(|s| s.trim().parse().ok())
}

fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Binds one parameter as the type Postgres inferred for its placeholder
///
/// Unknown or unlisted types fall back to the JSON kind of the value.
fn add_param(
    args: &mut PgArguments,
    position: usize,
    param: &JsonValue,
    target: &str,
) -> Result<(), QueryError> {
    let invalid = || QueryError::InvalidParam {
        position,
        expected: target.to_lowercase(),
    };

    match target {
        "BOOL" => args.add(scalar(param, JsonValue::as_bool).ok_or_else(invalid)?),
        "INT2" => args.add(
            scalar(param, |v| v.as_i64().and_then(|i| i16::try_from(i).ok()))
                .ok_or_else(invalid)?,
        ),
        "INT4" => args.add(
            scalar(param, |v| v.as_i64().and_then(|i| i32::try_from(i).ok()))
                .ok_or_else(invalid)?,
        ),
        "INT8" => args.add(scalar(param, JsonValue::as_i64).ok_or_else(invalid)?),
        "FLOAT4" => args.add(
            scalar(param, |v| v.as_f64().map(|f| f as f32)).ok_or_else(invalid)?,
        ),
        "FLOAT8" => args.add(scalar(param, JsonValue::as_f64).ok_or_else(invalid)?),
        "UUID" => args.add(scalar(param, parse_str::<Uuid>).ok_or_else(invalid)?),
        "TIMESTAMPTZ" => {
            args.add(scalar(param, parse_str::<DateTime<Utc>>).ok_or_else(invalid)?)
        }
        "TIMESTAMP" => {
            args.add(scalar(param, parse_str::<NaiveDateTime>).ok_or_else(invalid)?)
        }
        "DATE" => args.add(scalar(param, parse_str::<NaiveDate>).ok_or_else(invalid)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            args.add(scalar(param, as_text).ok_or_else(invalid)?)
        }
        _ => match param {
            JsonValue::Bool(b) => args.add(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => args.add(i),
                None => args.add(n.as_f64()),
            },
            JsonValue::String(s) => args.add(s.clone()),
            _ => args.add(None::<String>),
        },
    }

    Ok(())
}

/// Prepares `sql` to learn its parameter types, then binds `params` to match
///
/// Strings reach `uuid`, `timestamptz` and numeric columns as those types,
/// so `WHERE id = $1` works with an id passed as a JSON string.
async fn arguments(
    pool: &PgPool,
    sql: &str,
    params: &[JsonValue],
) -> Result<PgArguments, QueryError> {
    let prepared = pool.prepare(sql).await?;
    let types: Vec<String> = match prepared.parameters() {
        Some(Either::Left(types)) => types.iter().map(|t| t.name().to_uppercase()).collect(),
        _ => Vec::new(),
    };

    let mut args = PgArguments::default();
    for (index, param) in params.iter().enumerate() {
        let target = types.get(index).map(String::as_str).unwrap_or("");
        add_param(&mut args, index + 1, param, target)?;
    }

    Ok(args)
}

/// Screens and runs an admin statement
///
/// Parameters are bound positionally to `$1`, `$2`, ...
///
/// # Errors
///
/// - `QueryError::NotAllowed` if the statement fails the allow-list
/// - `QueryError::UnsupportedParam` if a parameter is an array or object
/// - `QueryError::InvalidParam` if a parameter does not fit its placeholder
/// - `QueryError::DatabaseError` if the statement fails
pub async fn execute(
    pool: &PgPool,
    query: &str,
    params: &[JsonValue],
) -> Result<QueryOutcome, QueryError> {
    if !is_query_allowed(query) {
        return Err(QueryError::NotAllowed);
    }
    check_params(params)?;

    let statement = normalize_query(query);

    if is_select(statement) {
        // the closing parenthesis sits on its own line so a trailing `--`
        // comment in the statement cannot swallow it
        let wrapped = format!(
            "SELECT COALESCE(json_agg(row_to_json(q)), '[]'::json) FROM (\n{}\n) AS q",
            statement
        );
        let args = arguments(pool, &wrapped, params).await?;
        let rows = sqlx::query_scalar_with::<_, JsonValue, _>(&wrapped, args)
            .fetch_one(pool)
            .await?;

        let rows = match rows {
            JsonValue::Array(rows) => rows,
            other => vec![other],
        };

        tracing::info!(rows = rows.len(), "Admin query returned rows");
        return Ok(QueryOutcome::Rows(rows));
    }

    let args = arguments(pool, statement, params).await?;
    let result = sqlx::query_with(statement, args).execute(pool).await?;

    tracing::info!(rows_affected = result.rows_affected(), "Admin statement executed");
    Ok(QueryOutcome::Affected(result.rows_affected()))
}
