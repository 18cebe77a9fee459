/// Router Module Index
///
/// Splits the portal's routes by how the access guard treats them.

/// JSON endpoints under `/api`. Excluded from the guard; the session endpoints
/// live here because an anonymous visitor must be able to log in.
pub mod api;

/// The static UI bundle. Every request reaching it has passed the guard.
pub mod ui;
