//! # Amari API Server
//!
//! Serves the Amari wedding platform API: accounts and sessions, the vendor
//! directory and onboarding workflow, planning tools, and the AI concierge.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` is honoured)
//! 2. Connect to PostgreSQL and apply migrations
//! 3. Bootstrap the admin account when `ADMIN_EMAIL`/`ADMIN_PASSWORD` are set
//! 4. Start the hourly purge of expired sessions and reset tokens
//! 5. Serve until SIGINT/SIGTERM
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p amari-api
//! ```

use amari_api::{
    app::{build_router, AppState},
    config::Config,
};
use amari_shared::{
    auth::password::hash_password,
    db::{
        maintenance::{spawn_purge_task, DEFAULT_PURGE_INTERVAL},
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::User,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.json_logs);

    tracing::info!(
        environment = config.environment.as_str(),
        "Amari API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    if let Some(admin) = &config.admin {
        let password_hash = hash_password(&admin.password)?;
        let user = User::upsert_admin(&pool, &admin.email, &password_hash).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "Admin account ready");
    }

    let purge_task = spawn_purge_task(pool.clone(), DEFAULT_PURGE_INTERVAL);

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config)?;
    if state.concierge.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, concierge will answer 503");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");
    purge_task.abort();
    close_pool(pool).await;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "amari_api=debug,amari_shared=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
