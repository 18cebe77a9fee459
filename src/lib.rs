use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core policy: the pure navigation guard and the path matcher in front of it.
pub mod guard;
pub mod matcher;

// Request-facing components.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod session;

// Routing split by how the guard treats each subtree.
pub mod routes;
use routes::{api, ui};

// --- Public Re-exports ---

pub use auth::SessionSignals;
pub use config::AppConfig;
pub use guard::{AccessPolicy, Decision, RoleHomes};
pub use matcher::{RouteMatcher, canonical_path};
pub use session::{HttpSessionBackend, MockSessionBackend, SessionState};

/// ApiDoc
///
/// OpenAPI document for the session endpoints, served at `/api/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_session, handlers::delete_session, handlers::get_session,
        handlers::health
    ),
    components(
        schemas(
            models::Role, models::LoginRequest, models::SessionResponse,
            models::SessionView, models::ErrorResponse,
        )
    ),
    tags(
        (name = "tutor-portal", description = "Tutoring center portal session API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single immutable container shared by every request: configuration, the guard
/// policy and matcher derived from it, and the session backend.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub policy: Arc<AccessPolicy>,
    pub matcher: Arc<RouteMatcher>,
    pub sessions: SessionState,
}

impl AppState {
    pub fn new(config: AppConfig, sessions: SessionState) -> Self {
        Self {
            policy: Arc::new(config.policy()),
            matcher: Arc::new(config.matcher()),
            config,
            sessions,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

/// access_guard
///
/// Runs the navigation guard in front of every route the matcher intercepts.
/// Allowed requests continue untouched; everything else gets a 307 to the login
/// path or the caller's home base.
///
/// Rules are applied to the canonical form of the path (see `canonical_path`), so
/// encoded or doubled separators cannot dodge a role base. A request skips the guard
/// only when both its raw and canonical paths are excluded.
///
/// A session that is redirected to login while still carrying a token (a role
/// with no home base) also has its cookies expired, so the follow-up request to
/// the login path arrives anonymous and is let through.
async fn access_guard(
    State(state): State<AppState>,
    session: SessionSignals,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let raw = request.uri().path();
    let path = canonical_path(raw);
    if !state.matcher.intercepts(raw) && !state.matcher.intercepts(&path) {
        return next.run(request).await;
    }

    let decision = state.policy.evaluate(&path, session.has_token(), session.role);
    let Some(target) = state.policy.target(decision) else {
        return next.run(request).await;
    };

    tracing::debug!(
        path = raw,
        canonical = %path,
        role = %session.role,
        authenticated = session.has_token(),
        location = target,
        "navigation redirected"
    );

    let redirect = Redirect::temporary(target);
    if decision == Decision::RedirectToLogin && session.has_token() {
        (auth::end_session(jar, &state.config), redirect).into_response()
    } else {
        redirect.into_response()
    }
}

/// create_router
///
/// Assembles the routing structure, installs the access guard and the
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation lives under /api so the guard leaves it alone.
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .nest("/api", api::api_routes())
        // Everything else is the UI bundle.
        .fallback_service(ui::ui_service(&state.config.ui_dir))
        // The guard wraps routes and fallback alike; exclusions are decided by the matcher.
        .layer(middleware::from_fn_with_state(state.clone(), access_guard))
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request tracing span with method, URI and the `x-request-id`
/// assigned by `SetRequestIdLayer`, so every log line of a request is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
