/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use amari_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = amari_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        rate_limit::{concierge_rate_limit, ApiLimiters},
        security::SecurityHeadersLayer,
        session::{optional_session, require_admin, require_session},
    },
};
use amari_shared::{
    concierge::{ConciergeClient, ConciergeError},
    ratelimit::RateLimiterRegistry,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is a cheap handle.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Per-IP rate limiters
    pub limiters: ApiLimiters,

    /// Gemini client, absent when no API key is configured
    pub concierge: Option<ConciergeClient>,
}

impl AppState {
    /// Creates new application state with a fresh limiter registry
    ///
    /// # Errors
    ///
    /// Returns an error if the concierge HTTP client cannot be built
    pub fn new(db: PgPool, config: Config) -> Result<Self, ConciergeError> {
        let concierge = config
            .concierge
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| ConciergeClient::new(key, config.concierge.model.as_str()))
            .transpose()?;

        Ok(Self {
            db,
            config: Arc::new(config),
            limiters: ApiLimiters::new(&RateLimiterRegistry::new()),
            concierge,
        })
    }

    /// Replaces the concierge client (tests point it at a local server)
    pub fn with_concierge(mut self, concierge: ConciergeClient) -> Self {
        self.concierge = Some(concierge);
        self
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                          # Health check (public)
/// └── /v1/
///     ├── GET  /ping
///     ├── /auth/
///     │   ├── POST /register, /login, /forgot-password, /reset-password
///     │   └── POST /logout, GET|PATCH /me, POST /change-password   (session)
///     ├── /vendors/
///     │   ├── GET /, GET /:id
///     │   └── PUT /:id (owner or admin), DELETE /:id (admin)       (session)
///     ├── /vendor-applications/
///     │   ├── POST /                                               (optional session)
///     │   └── GET /mine                                            (session)
///     ├── /posts/          GET /; POST /, DELETE /:id              (session for writes)
///     ├── /budget/         GET, POST /; PUT, DELETE /:id           (session)
///     ├── /guests/         GET, POST /; PUT, DELETE /:id           (session)
///     ├── /admin/          applications, review, stats, query      (admin)
///     └── POST /concierge/chat                                     (rate limited)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS
/// 3. Compression
/// 4. Request tracing
/// 5. Session / admin / rate limiting (per route)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{admin, applications, auth, budget, concierge, guests, health, posts, vendors};

    let session = from_fn_with_state(state.clone(), require_session);

    let health_routes = Router::new().route("/health", get(health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/me", get(auth::me).patch(auth::update_me))
                .route("/change-password", post(auth::change_password))
                .route_layer(session.clone()),
        );

    let vendor_routes = Router::new()
        .route("/", get(vendors::list_vendors))
        .route(
            "/:id",
            get(vendors::get_vendor).merge(
                put(vendors::update_vendor)
                    .delete(vendors::delete_vendor)
                    .route_layer(session.clone()),
            ),
        );

    let application_routes = Router::new()
        .route(
            "/",
            post(applications::submit_application).route_layer(from_fn_with_state(
                state.clone(),
                optional_session,
            )),
        )
        .route(
            "/mine",
            get(applications::my_applications).route_layer(session.clone()),
        );

    let post_routes = Router::new()
        .route(
            "/",
            get(posts::list_posts).merge(post(posts::create_post).route_layer(session.clone())),
        )
        .route(
            "/:id",
            delete(posts::delete_post).route_layer(session.clone()),
        );

    let budget_routes = Router::new()
        .route("/", get(budget::list_items).post(budget::create_item))
        .route("/:id", put(budget::update_item).delete(budget::delete_item))
        .route_layer(session.clone());

    let guest_routes = Router::new()
        .route("/", get(guests::list_guests).post(guests::create_guest))
        .route("/:id", put(guests::update_guest).delete(guests::delete_guest))
        .route_layer(session.clone());

    // Layers run bottom-up: the session is resolved before the role check
    let admin_routes = Router::new()
        .route("/applications", get(admin::list_applications))
        .route("/applications/:id/status", post(admin::review_application))
        .route("/stats", get(admin::stats))
        .route("/query", post(admin::run_query))
        .route_layer(from_fn(require_admin))
        .route_layer(session.clone());

    let concierge_routes = Router::new()
        .route("/chat", post(concierge::chat))
        .route_layer(from_fn_with_state(state.clone(), concierge_rate_limit));

    let v1_routes = Router::new()
        .route("/ping", get(health::ping))
        .nest("/auth", auth_routes)
        .nest("/vendors", vendor_routes)
        .nest("/vendor-applications", application_routes)
        .nest("/posts", post_routes)
        .nest("/budget", budget_routes)
        .nest("/guests", guest_routes)
        .nest("/admin", admin_routes)
        .nest("/concierge", concierge_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.is_production()))
        .with_state(state)
}

/// CORS policy for the configured origins
///
/// `*` allows any origin without credentials; an explicit list allows
/// credentials so the session cookie is sent cross-origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE];

    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amari_shared::db::pool::{create_lazy_pool, DatabaseConfig};

    fn lazy_pool(config: &Config) -> PgPool {
        create_lazy_pool(&DatabaseConfig {
            url: config.database.url.clone(),
            max_connections: 1,
            min_connections: 0,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_state_without_concierge_key() {
        let config = Config::for_tests();
        let state = AppState::new(lazy_pool(&config), config).unwrap();

        assert!(state.concierge.is_none());
        assert_eq!(state.limiters.login.options().max_attempts, 10);
    }

    #[tokio::test]
    async fn test_state_with_concierge_key() {
        let mut config = Config::for_tests();
        config.concierge.api_key = Some("test-key".to_string());
        let state = AppState::new(lazy_pool(&config), config).unwrap();

        let concierge = state.concierge.expect("concierge configured");
        assert_eq!(concierge.model(), amari_shared::concierge::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_blank_concierge_key_is_ignored() {
        let mut config = Config::for_tests();
        config.concierge.api_key = Some("   ".to_string());
        let state = AppState::new(lazy_pool(&config), config).unwrap();

        assert!(state.concierge.is_none());
    }

    #[test]
    fn test_cors_layer_builds_for_both_modes() {
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["https://amariexperience.com".to_string()]);
    }
}
