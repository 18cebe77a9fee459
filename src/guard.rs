//! Role-based navigation guard.
//!
//! Maps (request path, session presence, role claim) to a navigation decision. The
//! evaluation is pure: no I/O, no logging, no state between calls.

use std::collections::HashMap;
use thiserror::Error;

use crate::models::Role;

/// The bare root path. Authenticated sessions never stay on it.
pub const ROOT_PATH: &str = "/";

/// Default login route.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default Role→Home table.
pub const DEFAULT_HOMES: [(Role, &str); 4] = [
    (Role::Admin, "/admin"),
    (Role::Teacher, "/teacher"),
    (Role::Student, "/student"),
    (Role::SuperAdmin, "/super_admin"),
];

/// GuardError
///
/// Raised only while building a Role→Home table. A policy that was built
/// successfully cannot fail at request time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("role `{0}` is mapped to more than one home base")]
    DuplicateRole(Role),
    #[error("role `{0}` has no home base")]
    MissingRole(Role),
    #[error("the unknown role cannot own a home base")]
    UnknownRole,
    #[error("home base {0:?} must start with '/', must not be the root and must not end with '/'")]
    MalformedBase(String),
    #[error("home bases {0:?} and {1:?} overlap")]
    OverlappingBases(String, String),
}

/// Returns true when `path` is `base` itself or lies below it.
///
/// `/admin` covers `/admin` and `/admin/students`, never `/administrator`.
pub fn within(path: &str, base: &str) -> bool {
    path.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// RoleHomes
///
/// Immutable Role→Home mapping. Every known role owns exactly one base and no base
/// lies within another, so a path is owned by at most one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHomes {
    bases: HashMap<Role, String>,
}

impl Default for RoleHomes {
    /// The built-in table, run through the same checks as any other.
    ///
    /// # Panics
    /// Panics if `DEFAULT_HOMES` breaks an invariant.
    fn default() -> Self {
        Self::from_entries(DEFAULT_HOMES)
            .unwrap_or_else(|e| panic!("FATAL: built-in Role→Home table is invalid: {e}"))
    }
}

impl RoleHomes {
    /// Builds a table, checking every invariant the guard relies on.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, GuardError>
    where
        I: IntoIterator<Item = (Role, S)>,
        S: Into<String>,
    {
        let mut bases: HashMap<Role, String> = HashMap::new();

        for (role, base) in entries {
            let base = base.into();
            if !role.is_known() {
                return Err(GuardError::UnknownRole);
            }
            if !base.starts_with('/') || base == ROOT_PATH || base.ends_with('/') {
                return Err(GuardError::MalformedBase(base));
            }
            if let Some((_, other)) = bases
                .iter()
                .find(|(_, other)| within(&base, other) || within(other, &base))
            {
                return Err(GuardError::OverlappingBases(other.clone(), base));
            }
            if bases.insert(role, base).is_some() {
                return Err(GuardError::DuplicateRole(role));
            }
        }

        if let Some(missing) = Role::KNOWN.iter().find(|role| !bases.contains_key(*role)) {
            return Err(GuardError::MissingRole(*missing));
        }

        Ok(Self { bases })
    }

    /// The base owned by `role`, if any. `Role::Unknown` never has one.
    pub fn home(&self, role: Role) -> Option<&str> {
        self.bases.get(&role).map(String::as_str)
    }

    /// The role whose base covers `path`. Longest base wins if several match.
    pub fn owner_of(&self, path: &str) -> Option<Role> {
        self.bases
            .iter()
            .filter(|(_, base)| within(path, base))
            .max_by_key(|(_, base)| base.len())
            .map(|(role, _)| *role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.bases.iter().map(|(role, base)| (*role, base.as_str()))
    }
}

/// Decision
///
/// Outcome of one guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through unmodified.
    Allow,
    /// Send the caller to the login path.
    RedirectToLogin,
    /// Send the caller to the home base of the given role.
    RedirectToHome(Role),
}

/// AccessPolicy
///
/// The login path plus the Role→Home table. Built once at startup and shared
/// read-only across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    login_path: String,
    homes: RoleHomes,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PATH, RoleHomes::default())
    }
}

impl AccessPolicy {
    pub fn new(login_path: impl Into<String>, homes: RoleHomes) -> Self {
        Self {
            login_path: login_path.into(),
            homes,
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn homes(&self) -> &RoleHomes {
        &self.homes
    }

    /// evaluate
    ///
    /// Rules, first match wins:
    /// 1. no session, not on the login path: go to login;
    /// 2. session on the login path or the root: go home, or to login when the
    ///    role has no home;
    /// 3. session with a routable role inside another role's base: go home;
    /// 4. anything else is allowed.
    pub fn evaluate(&self, path: &str, has_token: bool, role: Role) -> Decision {
        if !has_token {
            return if path == self.login_path {
                Decision::Allow
            } else {
                Decision::RedirectToLogin
            };
        }

        let own_home = self.homes.home(role);

        if path == self.login_path || path == ROOT_PATH {
            return match own_home {
                Some(_) => Decision::RedirectToHome(role),
                None => Decision::RedirectToLogin,
            };
        }

        if own_home.is_some() {
            if let Some(owner) = self.homes.owner_of(path) {
                if owner != role {
                    return Decision::RedirectToHome(role);
                }
            }
        }

        Decision::Allow
    }

    /// The redirect location for a decision, `None` for `Allow`.
    pub fn target(&self, decision: Decision) -> Option<&str> {
        match decision {
            Decision::Allow => None,
            Decision::RedirectToLogin => Some(self.login_path.as_str()),
            // Only produced for roles that own a base.
            Decision::RedirectToHome(role) => {
                Some(self.homes.home(role).unwrap_or(self.login_path.as_str()))
            }
        }
    }
}
