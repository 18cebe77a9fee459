use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    session::{HttpSessionBackend, SessionState},
};

/// main
///
/// Loads configuration, sets up logging, wires the session backend and serves the
/// guarded portal.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise fall back to development defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tutor_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    if !config.ui_dir.join("index.html").is_file() {
        tracing::warn!(
            ui_dir = %config.ui_dir.display(),
            "UI bundle not found; guarded pages will answer 404"
        );
    }

    // 4. Session Backend (REST API)
    let sessions = Arc::new(HttpSessionBackend::new(&config.backend_url)) as SessionState;
    tracing::info!(backend = %config.backend_url, "session backend configured");

    // 5. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config, sessions);
    tracing::info!(
        login = app_state.policy.login_path(),
        excluded = ?app_state.matcher.excluded(),
        "access guard installed"
    );

    // 6. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/api/docs", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
