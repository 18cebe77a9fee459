use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Role Claim ---

/// Role
///
/// The closed set of role claims the portal understands. The role cookie is a
/// free-form string written at login; anything missing or unrecognized parses to
/// `Unknown`, which never owns a home base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    SuperAdmin,
    Unknown,
}

impl Role {
    /// Every role that can own a home base.
    pub const KNOWN: [Role; 4] = [Role::Admin, Role::Teacher, Role::Student, Role::SuperAdmin];

    /// Parses the raw cookie value. Matching is exact: `Admin` or ` admin` are unknown.
    pub fn parse(claim: Option<&str>) -> Self {
        match claim {
            Some("admin") => Role::Admin,
            Some("teacher") => Role::Teacher,
            Some("student") => Role::Student,
            Some("super_admin") => Role::SuperAdmin,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::SuperAdmin => "super_admin",
            Role::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Credentials posted by the login screen (POST /api/session). They are passed
/// through to the REST backend untouched; the portal never stores them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// --- Backend Contract ---

/// IssuedSession
///
/// What the REST backend returns for a successful login. `role` is kept as the raw
/// string so an unrecognized value still reaches the cookie and is handled by the
/// guard's fail-closed branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedSession {
    pub token: String,
    pub role: String,
}

// --- Response Payloads (Output Schemas) ---

/// SessionResponse
///
/// Returned after a successful login. `home` is where the UI should navigate next;
/// it is `null` when the backend issued a role the portal does not route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionResponse {
    pub role: Role,
    pub home: Option<String>,
}

/// SessionView
///
/// The guard's view of the caller (GET /api/session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub authenticated: bool,
    pub role: Role,
    pub home: Option<String>,
}

/// ErrorResponse
///
/// Body of every non-2xx response produced by the session endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
