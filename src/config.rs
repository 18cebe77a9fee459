use std::{env, path::PathBuf};

use crate::{
    guard::{AccessPolicy, DEFAULT_LOGIN_PATH, RoleHomes},
    matcher::{DEFAULT_EXCLUDED_PREFIXES, RouteMatcher, canonical_path},
};

/// AppConfig
///
/// Holds the portal's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers and the guard middleware pull it out of the
/// application state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and cookie hardening.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the REST backend that validates credentials.
    pub backend_url: String,
    // Directory holding the built UI bundle (index.html plus assets).
    pub ui_dir: PathBuf,
    // Route of the login screen.
    pub login_path: String,
    // Cookie carrying the opaque session token.
    pub session_cookie: String,
    // Cookie carrying the role claim.
    pub role_cookie: String,
    // Paths the guard never intercepts.
    pub excluded_prefixes: Vec<String>,
}

/// Env
///
/// Defines the runtime context. `Production` switches to JSON logs, marks session
/// cookies `Secure` and makes `BACKEND_URL` mandatory.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_UI_DIR: &str = "./dist";
const DEFAULT_SESSION_COOKIE: &str = "token";
const DEFAULT_ROLE_COOKIE: &str = "role";

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            ui_dir: PathBuf::from(DEFAULT_UI_DIR),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            role_cookie: DEFAULT_ROLE_COOKIE.to_string(),
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `BACKEND_URL` is not set: the portal cannot log
    /// anyone in without it.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let backend_url = match env {
            Env::Production => {
                env::var("BACKEND_URL").expect("FATAL: BACKEND_URL must be set in production.")
            }
            Env::Local => var_or("BACKEND_URL", DEFAULT_BACKEND_URL),
        };

        let excluded_prefixes = match env::var("GUARD_EXCLUDED_PREFIXES") {
            Ok(list) => RouteMatcher::from_list(&list).excluded().to_vec(),
            Err(_) => Self::default().excluded_prefixes,
        };

        Self {
            env,
            bind_addr: var_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            backend_url: backend_url.trim_end_matches('/').to_string(),
            ui_dir: PathBuf::from(var_or("UI_DIST_DIR", DEFAULT_UI_DIR)),
            login_path: login_path_from(&var_or("LOGIN_PATH", DEFAULT_LOGIN_PATH)),
            session_cookie: var_or("SESSION_COOKIE", DEFAULT_SESSION_COOKIE),
            role_cookie: var_or("ROLE_COOKIE", DEFAULT_ROLE_COOKIE),
            excluded_prefixes,
        }
    }

    /// The guard policy for this configuration, using the fixed Role→Home table.
    pub fn policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.login_path.clone(), RoleHomes::default())
    }

    pub fn matcher(&self) -> RouteMatcher {
        RouteMatcher::new(&self.excluded_prefixes)
    }

    /// Session cookies get the `Secure` attribute outside local development.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}

/// The guard compares canonical paths, so the login route is stored in the same
/// form. A value that canonicalizes to the root cannot be a login screen and falls
/// back to the default.
fn login_path_from(raw: &str) -> String {
    let path = canonical_path(raw.trim());
    if path == "/" {
        tracing::warn!(value = raw, "LOGIN_PATH resolves to the root; using {DEFAULT_LOGIN_PATH}");
        return DEFAULT_LOGIN_PATH.to_string();
    }
    path
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
