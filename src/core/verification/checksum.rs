//! Manifest checksum sidecar
//!
//! The sidecar keeps the `md5sum` text format, one `<32 hex>  <path>` line
//! per file, so it can still be checked with `md5sum -c`. Paths are stored
//! and resolved exactly as written.

use crate::domain::errors::AppExportError;
use crate::domain::Result;
use md5::{Digest, Md5};
use std::path::Path;

/// Hex-encoded MD5 digest of raw bytes
///
/// # Examples
///
/// ```
/// use appexport::core::verification::checksum::md5_hex;
///
/// assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// MD5 digest of a file's content
pub fn file_md5(path: &Path) -> Result<String> {
    let data = std::fs::read(path)
        .map_err(|e| AppExportError::Io(format!("read {}: {e}", path.display())))?;
    Ok(md5_hex(&data))
}

/// One sidecar line in `md5sum` text mode
pub fn sidecar_line(digest: &str, path: &Path) -> String {
    format!("{}  {}\n", digest, path.display())
}

/// Computes the checksum of `file` and writes it to `sidecar`
pub fn write_sidecar(file: &Path, sidecar: &Path) -> Result<()> {
    let digest = file_md5(file)?;
    std::fs::write(sidecar, sidecar_line(&digest, file))
        .map_err(|e| AppExportError::Io(format!("write {}: {e}", sidecar.display())))?;
    tracing::debug!(file = %file.display(), digest = %digest, "Wrote checksum sidecar");
    Ok(())
}

/// Parses one sidecar line into `(digest, path)`
///
/// Accepts both the text (`"  "`) and binary (`" *"`) separators.
pub fn parse_sidecar_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() < 34 {
        return None;
    }
    let (digest, rest) = line.split_at(32);
    if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let path = rest
        .strip_prefix("  ")
        .or_else(|| rest.strip_prefix(" *"))?;
    if path.is_empty() {
        return None;
    }
    Some((digest, path))
}

/// Checks every line of a sidecar against the files it names
///
/// A missing, empty or malformed sidecar does not verify.
pub fn verify_sidecar(sidecar: &Path) -> bool {
    let content = match std::fs::read_to_string(sidecar) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(sidecar = %sidecar.display(), error = %e, "Checksum sidecar unreadable");
            return false;
        }
    };

    let mut checked = 0usize;
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let Some((expected, path)) = parse_sidecar_line(line) else {
            tracing::debug!(sidecar = %sidecar.display(), line = %line, "Malformed checksum line");
            return false;
        };
        match file_md5(Path::new(path)) {
            Ok(actual) if actual.eq_ignore_ascii_case(expected) => checked += 1,
            Ok(actual) => {
                tracing::debug!(file = %path, expected = %expected, actual = %actual, "Checksum mismatch");
                return false;
            }
            Err(e) => {
                tracing::debug!(file = %path, error = %e, "Checksum target unreadable");
                return false;
            }
        }
    }

    checked > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test]
    fn test_md5_known_value() {
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test_case("5d41402abc4b2a76b9719d911017c592  /tmp/a/metadata.json", Some("/tmp/a/metadata.json"); "text mode")]
    #[test_case("5d41402abc4b2a76b9719d911017c592 */tmp/a/metadata.json\n", Some("/tmp/a/metadata.json"); "binary mode")]
    #[test_case("5d41402abc4b2a76b9719d911017c592 /tmp/a", None; "single space")]
    #[test_case("zz41402abc4b2a76b9719d911017c592  /tmp/a", None; "not hex")]
    #[test_case("5d41402abc4b2a76b9719d911017c592  ", None; "no path")]
    #[test_case("", None; "empty")]
    fn test_parse_sidecar_line(line: &str, expected: Option<&str>) {
        assert_eq!(parse_sidecar_line(line).map(|(_, p)| p), expected);
    }

    #[test]
    fn test_write_then_verify() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("metadata.json");
        let sidecar = dir.path().join("metadata.json.md5");
        std::fs::write(&file, "hello").unwrap();

        write_sidecar(&file, &sidecar).unwrap();
        let content = std::fs::read_to_string(&sidecar).unwrap();
        assert_eq!(
            content,
            format!("5d41402abc4b2a76b9719d911017c592  {}\n", file.display())
        );
        assert!(verify_sidecar(&sidecar));

        std::fs::write(&file, "changed").unwrap();
        assert!(!verify_sidecar(&sidecar));
    }

    #[test]
    fn test_missing_or_empty_sidecar_fails() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join("metadata.json.md5");
        assert!(!verify_sidecar(&sidecar));

        std::fs::write(&sidecar, "\n").unwrap();
        assert!(!verify_sidecar(&sidecar));
    }

    #[test]
    fn test_binary_marker_verifies() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("metadata.json");
        let sidecar = dir.path().join("metadata.json.md5");
        std::fs::write(&file, "hello").unwrap();
        std::fs::write(
            &sidecar,
            format!("5d41402abc4b2a76b9719d911017c592 *{}\n", file.display()),
        )
        .unwrap();
        assert!(verify_sidecar(&sidecar));
    }
}
