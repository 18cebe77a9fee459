use percent_encoding::percent_decode_str;

use crate::guard::within;

/// Paths the guard never intercepts: static assets, the bundler's internal asset
/// path, the favicon and the backend API prefix.
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 4] = ["/assets", "/_app", "/favicon.ico", "/api"];

/// canonical_path
///
/// The form of a request path the guard evaluates: percent-decoded once, empty and
/// `.` segments dropped, `..` resolved, no trailing `/`. `/%61dmin//students/` and
/// `/teacher/%2e%2e/admin/students` both become `/admin/students`, which is what the
/// UI's client-side router will render for them.
pub fn canonical_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();

    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

/// RouteMatcher
///
/// Decides which request paths go through the access guard. A prefix excludes the
/// path equal to it and everything below it (`/api` excludes `/api/session` but not
/// `/apiary`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatcher {
    excluded: Vec<String>,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PREFIXES)
    }
}

impl RouteMatcher {
    /// Normalizes each prefix: trims whitespace, forces a leading `/`, strips
    /// trailing `/`. Empty entries and the bare root are dropped.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = prefixes
            .into_iter()
            .filter_map(|prefix| {
                let trimmed = prefix.as_ref().trim().trim_matches('/');
                (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
            })
            .collect();

        Self { excluded }
    }

    /// Parses a comma-separated list, as found in `GUARD_EXCLUDED_PREFIXES`.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Returns true when the guard must evaluate `path`.
    pub fn intercepts(&self, path: &str) -> bool {
        !self.excluded.iter().any(|prefix| within(path, prefix))
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }
}
