use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// ui_service
///
/// Serves the built UI bundle. Unknown paths fall back to `index.html` so the
/// client-side router can render role pages such as `/teacher/attendance`.
pub fn ui_service(dist: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")))
}
