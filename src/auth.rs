use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;

use crate::{config::AppConfig, models::Role};

/// SessionSignals
///
/// The two cookie-borne signals the guard works from: whether a session token is
/// present, and the role claim. The token is never validated or decoded here; the
/// REST backend does that on every API call it receives.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSignals {
    /// The raw session token, if the cookie is present and non-empty.
    pub token: Option<String>,
    /// The parsed role claim. `Role::Unknown` when absent or unrecognized.
    pub role: Role,
}

impl SessionSignals {
    /// Reads both signals from a cookie jar using the configured cookie names.
    pub fn from_jar(jar: &CookieJar, config: &AppConfig) -> Self {
        let token = jar
            .get(&config.session_cookie)
            .map(|cookie| cookie.value().trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let role = Role::parse(jar.get(&config.role_cookie).map(|cookie| cookie.value()));

        Self { token, role }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

/// SessionSignals Extractor Implementation
///
/// Never rejects: a request without cookies simply yields an absent token and an
/// unknown role, which the guard treats as an anonymous visitor.
impl<S> FromRequestParts<S> for SessionSignals
where
    S: Send + Sync,
    // Allows the extractor to pull the cookie names from the app state.
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Self::from_jar(&jar, &config))
    }
}

/// session_cookie
///
/// Builds one of the two session cookies. They are readable from script (no
/// `HttpOnly`) because the UI reads the role to render its navigation.
fn session_cookie(name: &str, value: &str, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .http_only(false)
        .build()
}

/// Adds the token and role cookies issued at login.
pub fn start_session(jar: CookieJar, config: &AppConfig, token: &str, role: &str) -> CookieJar {
    jar.add(session_cookie(&config.session_cookie, token, config))
        .add(session_cookie(&config.role_cookie, role, config))
}

/// Expires the session cookies the request carried.
pub fn end_session(jar: CookieJar, config: &AppConfig) -> CookieJar {
    jar.remove(Cookie::build((config.session_cookie.clone(), "")).path("/"))
        .remove(Cookie::build((config.role_cookie.clone(), "")).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};

    fn jar(cookie_header: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie_header).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_signals_from_cookies() {
        let signals = SessionSignals::from_jar(&jar("token=abc; role=teacher"), &AppConfig::default());
        assert_eq!(signals.token.as_deref(), Some("abc"));
        assert_eq!(signals.role, Role::Teacher);
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let signals = SessionSignals::from_jar(&jar("token=; role=admin"), &AppConfig::default());
        assert!(!signals.has_token());
        assert_eq!(signals.role, Role::Admin);
    }

    #[test]
    fn test_unrecognized_role_is_unknown() {
        let signals = SessionSignals::from_jar(&jar("token=abc; role=parent"), &AppConfig::default());
        assert_eq!(signals.role, Role::Unknown);
    }

    #[test]
    fn test_custom_cookie_names() {
        let config = AppConfig {
            session_cookie: "sid".to_string(),
            role_cookie: "claim".to_string(),
            ..AppConfig::default()
        };
        let signals = SessionSignals::from_jar(&jar("token=abc; sid=xyz; claim=student"), &config);
        assert_eq!(signals.token.as_deref(), Some("xyz"));
        assert_eq!(signals.role, Role::Student);
    }

    #[test]
    fn test_start_and_end_session() {
        let config = AppConfig::default();
        let started = start_session(CookieJar::new(), &config, "abc", "admin");
        assert_eq!(started.get("token").map(|c| c.value()), Some("abc"));
        assert_eq!(started.get("role").map(|c| c.value()), Some("admin"));
        assert_eq!(started.get("token").and_then(|c| c.path()), Some("/"));

        let ended = end_session(started, &config);
        assert!(ended.get("token").is_none());
        assert!(ended.get("role").is_none());
    }
}
