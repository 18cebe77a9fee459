use async_trait::async_trait;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reqwest::header;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use thiserror::Error;

use crate::models::{ErrorResponse, IssuedSession, LoginRequest};

/// BackendError
///
/// Failures the REST backend can produce while issuing or revoking a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend refused the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The backend could not be reached or answered with an unexpected status.
    #[error("session backend unavailable: {0}")]
    Unavailable(String),
    /// The backend answered 2xx with a body that is not a usable session.
    #[error("malformed session backend response: {0}")]
    MalformedResponse(String),
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = match self {
            BackendError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            BackendError::Unavailable(_) | BackendError::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// 1. SessionBackend Contract
/// SessionBackend
///
/// The part of the REST backend the portal itself talks to. Handlers only see this
/// trait, so tests swap the HTTP client for `MockSessionBackend`.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Exchanges credentials for a session token and role claim.
    async fn login(&self, credentials: &LoginRequest) -> Result<IssuedSession, BackendError>;

    /// Revokes a session token.
    async fn logout(&self, token: &str) -> Result<(), BackendError>;
}

/// SessionState
///
/// The concrete type used to share the session backend across the application state.
pub type SessionState = Arc<dyn SessionBackend>;

// 2. The Real Implementation (REST backend over HTTP)
/// HttpSessionBackend
///
/// Calls `POST {base}/auth/login` and `POST {base}/auth/logout` with JSON bodies.
#[derive(Clone)]
pub struct HttpSessionBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SessionBackend for HttpSessionBackend {
    async fn login(&self, credentials: &LoginRequest) -> Result<IssuedSession, BackendError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(BackendError::Unavailable(format!("login returned {status}")));
        }

        let session = response
            .json::<IssuedSession>()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        if session.token.trim().is_empty() {
            return Err(BackendError::MalformedResponse("empty token".to_string()));
        }

        Ok(session)
    }

    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url("/auth/logout"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!(
                "logout returned {}",
                response.status()
            )))
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockSessionBackend
///
/// In-memory accounts keyed by username. Records every revoked token so tests can
/// assert that logout reached the backend.
#[derive(Default)]
pub struct MockSessionBackend {
    accounts: HashMap<String, (String, IssuedSession)>,
    /// When true, every call returns `BackendError::Unavailable`.
    pub should_fail: bool,
    revoked: Mutex<Vec<String>>,
}

impl MockSessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Registers an account that logs in with `password` and receives `token`/`role`.
    pub fn with_account(mut self, username: &str, password: &str, token: &str, role: &str) -> Self {
        self.accounts.insert(
            username.to_string(),
            (
                password.to_string(),
                IssuedSession {
                    token: token.to_string(),
                    role: role.to_string(),
                },
            ),
        );
        self
    }

    /// Tokens passed to `logout`, in call order.
    pub fn revoked(&self) -> Vec<String> {
        self.revoked
            .lock()
            .map(|tokens| tokens.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionBackend for MockSessionBackend {
    async fn login(&self, credentials: &LoginRequest) -> Result<IssuedSession, BackendError> {
        if self.should_fail {
            return Err(BackendError::Unavailable("Mock Backend Error: Simulation requested".to_string()));
        }

        match self.accounts.get(&credentials.username) {
            Some((password, session)) if *password == credentials.password => Ok(session.clone()),
            _ => Err(BackendError::InvalidCredentials),
        }
    }

    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        if self.should_fail {
            return Err(BackendError::Unavailable("Mock Backend Error: Simulation requested".to_string()));
        }

        if let Ok(mut revoked) = self.revoked.lock() {
            revoked.push(token.to_string());
        }
        Ok(())
    }
}
