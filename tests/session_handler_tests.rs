use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use tower::util::ServiceExt;
use tutor_portal::{
    AppConfig, AppState, MockSessionBackend, SessionState, create_router,
    models::{ErrorResponse, LoginRequest, Role, SessionResponse, SessionView},
};

// --- Setup ---

fn backend() -> MockSessionBackend {
    MockSessionBackend::new()
        .with_account("amina", "s3cret", "tok-admin", "admin")
        .with_account("tomas", "chalk", "tok-teacher", "teacher")
        .with_account("guest", "guest", "tok-guest", "parent")
}

fn app(backend: Arc<MockSessionBackend>) -> axum::Router {
    let sessions = backend as SessionState;
    create_router(AppState::new(AppConfig::default(), sessions))
}

async fn login(app: axum::Router, username: &str, password: &str) -> Response {
    let payload = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&payload).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect()
}

// --- Login ---

#[tokio::test]
async fn test_login_sets_session_cookies() {
    let response = login(app(Arc::new(backend())), "tomas", "chalk").await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let token = cookies
        .iter()
        .find(|c| c.starts_with("token="))
        .expect("token cookie set");
    assert!(token.starts_with("token=tok-teacher"));
    assert!(token.contains("Path=/"));
    assert!(token.contains("SameSite=Lax"));
    assert!(!token.contains("HttpOnly"));
    assert!(!token.contains("Secure"));
    assert!(cookies.iter().any(|c| c.starts_with("role=teacher")));

    let body: SessionResponse = json(response).await;
    assert_eq!(body.role, Role::Teacher);
    assert_eq!(body.home.as_deref(), Some("/teacher"));
}

#[tokio::test]
async fn test_login_with_unrouted_role_has_no_home() {
    let response = login(app(Arc::new(backend())), "guest", "guest").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).iter().any(|c| c.starts_with("role=parent")));

    let body: SessionResponse = json(response).await;
    assert_eq!(body.role, Role::Unknown);
    assert_eq!(body.home, None);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let response = login(app(Arc::new(backend())), "amina", "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());

    let body: ErrorResponse = json(response).await;
    assert_eq!(body.error, "invalid credentials");
}

#[tokio::test]
async fn test_login_reports_backend_outage() {
    let response = login(app(Arc::new(MockSessionBackend::new_failing())), "amina", "s3cret").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_production_cookies_are_secure() {
    let config = AppConfig {
        env: tutor_portal::config::Env::Production,
        ..AppConfig::default()
    };
    let router = create_router(AppState::new(config, Arc::new(backend()) as SessionState));

    let response = login(router, "amina", "s3cret").await;
    assert!(set_cookies(&response).iter().all(|c| c.contains("Secure")));
}

// --- Session View ---

#[tokio::test]
async fn test_session_view() {
    let cases = [
        (Some("token=tok-admin; role=admin"), true, Role::Admin, Some("/admin")),
        (Some("token=tok-guest; role=parent"), true, Role::Unknown, None),
        (Some("role=admin"), false, Role::Unknown, None),
        (None, false, Role::Unknown, None),
    ];

    for (cookies, authenticated, role, home) in cases {
        let mut request = Request::builder().method("GET").uri("/api/session");
        if let Some(cookies) = cookies {
            request = request.header(header::COOKIE, cookies);
        }
        let response = app(Arc::new(backend()))
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let view: SessionView = json(response).await;
        assert_eq!(
            view,
            SessionView {
                authenticated,
                role,
                home: home.map(str::to_string),
            },
            "cookies: {cookies:?}"
        );
    }
}

// --- Logout ---

async fn logout(app: axum::Router, cookies: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method("DELETE")
            .uri("/api/session")
            .header(header::COOKIE, cookies)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_logout_revokes_and_expires() {
    let backend = Arc::new(backend());
    let response = logout(app(backend.clone()), "token=tok-admin; role=admin").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    assert_eq!(backend.revoked(), vec!["tok-admin".to_string()]);
}

#[tokio::test]
async fn test_logout_survives_backend_outage() {
    let response = logout(
        app(Arc::new(MockSessionBackend::new_failing())),
        "token=tok-admin; role=admin",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(set_cookies(&response).len(), 2);
}

#[tokio::test]
async fn test_logout_without_session_skips_backend() {
    let backend = Arc::new(backend());
    let response = logout(app(backend.clone()), "role=admin").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(backend.revoked().is_empty());
}
