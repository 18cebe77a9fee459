use crate::{
    AppState,
    auth::{self, SessionSignals},
    models::{ErrorResponse, LoginRequest, Role, SessionResponse, SessionView},
    session::BackendError,
};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;

// --- Handlers ---

/// create_session
///
/// [API Route] Logs a user in. The credentials are checked by the REST backend;
/// on success the token and role it issued are stored in the session cookies the
/// guard reads on every navigation.
///
/// The response tells the UI where to go next. `home` is `null` when the backend
/// issued a role the portal does not route; the next navigation then lands on the
/// login screen through the guard's fail-closed branch.
#[utoipa::path(
    post,
    path = "/api/session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse)
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), BackendError> {
    let issued = state.sessions.login(&payload).await.inspect_err(|e| {
        tracing::warn!(username = %payload.username, error = %e, "login rejected");
    })?;

    let role = Role::parse(Some(issued.role.as_str()));
    let home = state.policy.homes().home(role).map(str::to_string);

    if home.is_none() {
        tracing::warn!(
            username = %payload.username,
            role = %issued.role,
            "backend issued a role with no home base"
        );
    }

    let jar = auth::start_session(jar, &state.config, &issued.token, &issued.role);
    tracing::info!(username = %payload.username, %role, "session started");

    Ok((jar, Json(SessionResponse { role, home })))
}

/// delete_session
///
/// [API Route] Logs the caller out. The backend is told to revoke the token on a
/// best-effort basis; the cookies are expired regardless of its answer.
#[utoipa::path(
    delete,
    path = "/api/session",
    responses((status = 204, description = "Logged out"))
)]
pub async fn delete_session(
    State(state): State<AppState>,
    session: SessionSignals,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    if let Some(token) = session.token.as_deref() {
        if let Err(e) = state.sessions.logout(token).await {
            tracing::warn!(error = %e, "backend logout failed; clearing cookies anyway");
        }
    }

    (auth::end_session(jar, &state.config), StatusCode::NO_CONTENT)
}

/// get_session
///
/// [API Route] Reports how the guard sees the caller: whether a session is
/// present, which role it claims, and the home base that role owns.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Session view", body = SessionView))
)]
pub async fn get_session(
    State(state): State<AppState>,
    session: SessionSignals,
) -> Json<SessionView> {
    let authenticated = session.has_token();
    let role = if authenticated {
        session.role
    } else {
        Role::Unknown
    };

    Json(SessionView {
        authenticated,
        role,
        home: state.policy.homes().home(role).map(str::to_string),
    })
}

/// health
///
/// [API Route] Liveness probe for load balancers.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
