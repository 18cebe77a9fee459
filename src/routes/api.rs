use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// API Router Module
///
/// Mounted under `/api`, which the default route matcher excludes from the
/// access guard. Handlers read the session cookies themselves where they need them.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        .route("/health", get(handlers::health))
        // POST /api/session   log in and set the session cookies
        // GET /api/session    the guard's view of the caller
        // DELETE /api/session log out and expire the cookies
        .route(
            "/session",
            get(handlers::get_session)
                .post(handlers::create_session)
                .delete(handlers::delete_session),
        )
}
