use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use logbook_core::store::{EntryStore, InMemoryEntryStore, InMemoryTemplateStore, TemplateStore};
use logbook_core::upload::LocalUploadService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logbook_api::auth::jwt::TokenVerifier;
use logbook_api::config::{ServerConfig, StoreBackend};
use logbook_api::router::build_app_router;
use logbook_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logbook_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = config.store_backend.as_str(),
        "Loaded server configuration",
    );

    // --- Stores ---
    let (templates, entries, pool): (Arc<dyn TemplateStore>, Arc<dyn EntryStore>, _) =
        match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .expect("DATABASE_URL must be set");

                let pool = logbook_db::create_pool(database_url)
                    .await
                    .expect("Failed to connect to database");
                tracing::info!("Database connection pool created");

                logbook_db::health_check(&pool)
                    .await
                    .expect("Database health check failed");
                tracing::info!("Database health check passed");

                logbook_db::run_migrations(&pool)
                    .await
                    .expect("Failed to run database migrations");
                tracing::info!("Database migrations applied");

                let templates: Arc<dyn TemplateStore> =
                    Arc::new(logbook_db::PgTemplateStore::new(pool.clone()));
                let entries: Arc<dyn EntryStore> =
                    Arc::new(logbook_db::PgEntryStore::new(pool.clone()));
                (templates, entries, Some(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data will not survive a restart");
                let template_store = InMemoryTemplateStore::new();
                let entries: Arc<dyn EntryStore> =
                    Arc::new(InMemoryEntryStore::new(&template_store));
                let templates: Arc<dyn TemplateStore> = Arc::new(template_store);
                (templates, entries, None)
            }
        };

    // --- Uploads ---
    tokio::fs::create_dir_all(&config.upload.dir)
        .await
        .expect("Failed to create upload directory");
    let uploads = Arc::new(LocalUploadService::new(
        config.upload.dir.clone(),
        &config.upload.public_base,
        config.upload.max_bytes,
    ));
    tracing::info!(dir = %config.upload.dir.display(), "Upload storage ready");

    // --- App state ---
    let state = AppState {
        templates,
        entries,
        uploads,
        tokens: Arc::new(TokenVerifier::new(&config.jwt)),
        pool: pool.clone(),
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if let Some(pool) = pool {
        let close = tokio::time::timeout(
            Duration::from_secs(config.shutdown_timeout_secs),
            pool.close(),
        );
        if close.await.is_err() {
            tracing::warn!(
                timeout_secs = config.shutdown_timeout_secs,
                "Timed out closing database pool"
            );
        } else {
            tracing::info!("Database pool closed");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
