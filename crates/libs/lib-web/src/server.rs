//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! This module provides the main server setup function that creates the Axum router,
//! registers all routes, applies middleware, and starts the HTTP server.

// region: --- Imports
use axum::routing::{get, post, put};
use axum::Router;
use lib_auth::RevokedTokens;
use lib_core::config::{core_config, init_config};
use lib_core::{create_pool, Config, DbPool};

use crate::collab::{AiBridge, BroadcastPipeline, RoomHub, RoomRegistry};
use crate::handlers;
use crate::middleware::{log_requests, require_auth, stamp_req};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    /// Per-project broadcast channels
    pub hub: Arc<RoomHub>,
    /// Project directory lookups for the WebSocket handshake
    pub registry: Arc<RoomRegistry>,
    /// Persist-then-fan-out path shared by every room session
    pub pipeline: Arc<BroadcastPipeline>,
    /// Inference bridge shared by the chat path and the direct AI endpoint
    pub bridge: Arc<AiBridge>,
    /// Logged-out tokens
    pub revoked: Arc<RevokedTokens>,
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<RevokedTokens> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.revoked)
    }
}

impl axum::extract::FromRef<AppState> for Arc<AiBridge> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.bridge)
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Database migrations path
    pub migrations_path: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            migrations_path: "./migrations",
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize and start the HTTP server
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Returns
///
/// Returns `Ok(())` if the server starts successfully, or an error if initialization fails.
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading fails
/// - Database connection fails
/// - Database migrations fail
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Configure tracing subscriber with detailed formatting
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" => tracing_subscriber::EnvFilter::new("trace"),
        "debug" => tracing_subscriber::EnvFilter::new("debug"),
        "info" => tracing_subscriber::EnvFilter::new("info"),
        "warn" => tracing_subscriber::EnvFilter::new("warn"),
        "error" => tracing_subscriber::EnvFilter::new("error"),
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global tracing subscriber");

    info!(" COLLABORATIVE WORKSPACE BACKEND STARTING");
    info!(" Log level: {}", log_level);

    dotenvy::dotenv().ok();

    info!("Loading configuration...");
    init_config().map_err(|e| anyhow::anyhow!(e))?;
    let app_config = core_config().clone();

    info!("Database URL: {}", app_config.database_url);

    // Ensure data directory exists for SQLite database
    if let Some(db_path) = app_config.database_url.strip_prefix("sqlite:") {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created database directory: {:?}", parent);
            }
        }
        info!("Database file will be at: {}", db_path);
    }

    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!(" Running database migrations from: {}", config.migrations_path);
    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(config.migrations_path)).await?;
    migrator.run(&pool).await?;
    info!(" Migrations complete");

    // Collaboration plumbing: one hub, one registry, one pipeline, one bridge
    let hub = Arc::new(RoomHub::new());
    let registry = Arc::new(RoomRegistry::new(pool.clone()));
    let bridge = Arc::new(AiBridge::from_env());
    let pipeline = Arc::new(BroadcastPipeline::new(
        pool.clone(),
        Arc::clone(&hub),
        Arc::clone(&bridge),
    ));
    let revoked = Arc::new(RevokedTokens::new());

    // Periodically drop revocation entries whose tokens have expired anyway
    tokio::spawn({
        let revoked = Arc::clone(&revoked);
        async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                let removed = revoked.prune_expired();
                if removed > 0 {
                    info!(
                        "[AUTH] REVOCATION_SWEEP removed={} remaining={}",
                        removed,
                        revoked.len()
                    );
                }
            }
        }
    });
    info!(" Revocation sweep started (1h interval)");

    let state = AppState {
        db: pool,
        config: app_config,
        hub,
        registry,
        pipeline,
        bridge,
        revoked,
    };

    // Create router
    let app = create_router(state, config.allowed_origins.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    // Use into_make_service_with_connect_info to enable ConnectInfo extraction
    // This is required for WebSocket handlers that need client connection info
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Create the main application router with all routes
fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    use axum::http::{HeaderValue, Method};

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    info!("[ROUTE SETUP] Registering HTTP routes...");

    // Everything here runs behind the bearer-auth middleware
    let protected = Router::new()
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route("/api/auth/logout", get(handlers::auth::logout))
        .route("/api/users", get(handlers::users::list_users))
        .route(
            "/api/projects",
            post(handlers::projects::create_project).get(handlers::projects::list_projects),
        )
        .route("/api/projects/{id}", get(handlers::projects::get_project))
        .route(
            "/api/projects/{id}/members",
            put(handlers::projects::add_members),
        )
        .route(
            "/api/projects/{id}/file-tree",
            put(handlers::projects::update_file_tree),
        )
        .route(
            "/api/projects/{id}/messages",
            get(handlers::messages::project_messages).delete(handlers::messages::purge_messages),
        )
        .route("/api/ai", get(handlers::ai::get_ai_result))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Public surface: account entry points, the WebSocket handshake (which
    // checks credentials itself, pre-upgrade), and the health probe
    let app = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/ws/projects/{project_id}",
            get(handlers::websocket::project_websocket),
        )
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .merge(protected)
        .with_state(state)
        // Request stamping (adds request ID) - must be first
        .layer(axum::middleware::from_fn(stamp_req))
        // Comprehensive request/response logging
        .layer(axum::middleware::from_fn(log_requests))
        // Tower HTTP trace layer for spans
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<crate::middleware::mw_req_stamp::RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let _enter = span.enter();
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        .layer(cors);

    app
}

/// Log server information
fn log_server_info() {
    info!(" AUTH:");
    info!("   • POST /api/auth/register");
    info!("   • POST /api/auth/login");
    info!("   • GET  /api/auth/profile");
    info!("   • GET  /api/auth/logout");
    info!(" USERS:");
    info!("   • GET  /api/users");
    info!(" PROJECTS:");
    info!("   • POST /api/projects");
    info!("   • GET  /api/projects");
    info!("   • GET  /api/projects/{{id}}");
    info!("   • PUT  /api/projects/{{id}}/members");
    info!("   • PUT  /api/projects/{{id}}/file-tree");
    info!(" MESSAGES:");
    info!("   • GET    /api/projects/{{id}}/messages");
    info!("   • DELETE /api/projects/{{id}}/messages");
    info!(" AI:");
    info!("   • GET  /api/ai?prompt={{prompt}}");
    info!(" WEBSOCKET:");
    info!("   • GET  /api/ws/projects/{{project_id}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
