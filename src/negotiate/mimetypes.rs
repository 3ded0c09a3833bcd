//! Format-name to mimetype lookup for the `_format` override.
//!
//! A format is treated like a file extension: `json` resolves to
//! `application/json` the way `report.json` would.

const TYPES_MAP: &[(&str, &str)] = &[
    ("json", "application/json"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("xml", "application/xml"),
    ("csv", "text/csv"),
    ("js", "application/javascript"),
    ("css", "text/css"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
];

/// Guess the mimetype for a format name. A leading dot is ignored and the
/// lookup is case-insensitive.
pub fn guess_type(format: &str) -> Option<&'static str> {
    let ext = format.trim().trim_start_matches('.');
    TYPES_MAP
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime_type)| *mime_type)
}
