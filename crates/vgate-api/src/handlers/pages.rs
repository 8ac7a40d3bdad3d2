//! Static page handlers.

use std::path::Path;

use tower_http::services::ServeFile;

/// Service for `GET /tch`: the configured HTML file, with its content type
/// taken from the extension.
pub fn tch_page(path: impl AsRef<Path>) -> ServeFile {
    ServeFile::new(path)
}
