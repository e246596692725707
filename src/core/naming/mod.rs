//! Name sanitizing
//!
//! - [`sanitize`] - escape decoding, identifier transliteration, file names
//! - [`registry`] - collision-free service names keyed by share identifier

pub mod registry;
pub mod sanitize;

pub use registry::ServiceNameRegistry;
pub use sanitize::{decode_escapes, is_identifier_char, linux_file_name, to_identifier};

/// Decoded display name as a single directory name for per-app directories
///
/// Path separators become `_`, and names that would resolve to the current
/// or parent directory become `_`.
pub fn sanitize(raw: &str) -> String {
    let name = decode_escapes(raw).replace(['/', '\\'], "_");
    match name.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => name,
    }
}
