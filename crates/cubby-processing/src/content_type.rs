//! Content-type resolution for uploads.

/// Resolve the stored content type from what the client declared and the
/// filename extension. Declared types win; blank or generic declarations fall
/// back to a guess from the extension.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared {
        Some(ct) if !ct.trim().is_empty() && ct != "application/octet-stream" => ct.to_string(),
        _ => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}
