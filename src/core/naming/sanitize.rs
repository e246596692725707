//! Display-name decoding and identifier transliteration
//!
//! Component names arrive from the manifest as text that may embed `\uXXXX`
//! escapes (sometimes double-escaped as `\\uXXXX`). They are decoded for
//! directory names and transliterated into `[A-Za-z0-9._-]` for service keys
//! and volume names.

use pinyin::ToPinyin;

/// Decodes `\uXXXX` escapes and trims surrounding whitespace
///
/// Sequences that are not followed by four hex digits, or that do not name
/// a valid scalar value, are kept literally.
///
/// # Examples
///
/// ```
/// use appexport::core::naming::decode_escapes;
///
/// assert_eq!(decode_escapes(r"2048应用 "), "2048应用");
/// assert_eq!(decode_escapes(r"web\\u670d"), "web服");
/// ```
pub fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match decode_escape_at(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('\\');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

/// Decodes one escape at the start of `tail`, returning the character and
/// the number of bytes consumed
fn decode_escape_at(tail: &str) -> Option<(char, usize)> {
    let marker_len = if tail.starts_with("\\\\u") {
        3
    } else if tail.starts_with("\\u") {
        2
    } else {
        return None;
    };

    let hex = tail.get(marker_len..marker_len + 4)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let code = u32::from_str_radix(hex, 16).ok()?;
    let ch = char::from_u32(code)?;
    Some((ch, marker_len + 4))
}

/// Whether `c` may appear verbatim in an identifier
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Whether `c` belongs to a CJK ideograph block
pub fn is_han(c: char) -> bool {
    matches!(c as u32,
        0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xF900..=0xFAFF
        | 0x20000..=0x2A6DF
        | 0x2A700..=0x2EBEF
        | 0x30000..=0x3134F)
}

/// Converts a (possibly escaped) display name into `[A-Za-z0-9._-]*`
///
/// Han characters become their toneless romanization, concatenated without
/// separators; every other disallowed character becomes `_`.
///
/// # Examples
///
/// ```
/// use appexport::core::naming::to_identifier;
///
/// assert_eq!(to_identifier("测试"), "ceshi");
/// assert_eq!(to_identifier("my app!"), "my_app_");
/// ```
pub fn to_identifier(raw: &str) -> String {
    let decoded = decode_escapes(raw);
    let mut out = String::with_capacity(decoded.len());

    for c in decoded.chars() {
        if is_identifier_char(c) {
            out.push(c);
        } else if is_han(c) {
            match c.to_pinyin() {
                Some(p) => out.push_str(p.plain()),
                None => {
                    tracing::warn!(character = %c, name = %decoded, "No romanization available");
                    out.push('_');
                }
            }
        } else {
            out.push('_');
        }
    }

    tracing::debug!(name = %decoded, identifier = %out, "Converted display name");
    out
}

/// Turns an image reference or artifact path into a flat file name
///
/// Only the last `/` segment is kept; a reference ending in `/` keeps every
/// segment joined by `---` instead. `:` becomes `--` and whitespace is
/// dropped.
///
/// # Examples
///
/// ```
/// use appexport::core::naming::linux_file_name;
///
/// assert_eq!(linux_file_name("goodrain.me/percona-mysql:5.5"), "percona-mysql--5.5");
/// assert_eq!(linux_file_name("/app_publish/v1.0_2018.tgz"), "v1.0_2018.tgz");
/// ```
pub fn linux_file_name(reference: &str) -> String {
    if reference.is_empty() {
        return String::new();
    }

    let base = match reference.rsplit('/').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => reference.replace('/', "---"),
    };

    base.replace(':', "--")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r"\u6d4b\u8bd5", "测试" ; "single escape marker")]
    #[test_case(r"\\u6d4b\\u8bd5", "测试" ; "double escape marker")]
    #[test_case(r"  2048应用  ", "2048应用" ; "trimmed")]
    #[test_case("plain-name", "plain-name" ; "no escapes")]
    #[test_case(r"bad\uZZZZ", r"bad\uZZZZ" ; "invalid hex kept")]
    #[test_case(r"short\u12", r"short\u12" ; "truncated escape kept")]
    #[test_case(r"\ud800x", r"\ud800x" ; "lone surrogate kept")]
    #[test_case(r"path\to", r"path\to" ; "plain backslash kept")]
    fn test_decode_escapes(raw: &str, expected: &str) {
        assert_eq!(decode_escapes(raw), expected);
    }

    #[test_case("测试", "ceshi" ; "han romanized")]
    #[test_case(r"\u6d4b\u8bd5", "ceshi" ; "escaped han romanized")]
    #[test_case("web-1.0_a", "web-1.0_a" ; "allowed kept")]
    #[test_case("my app", "my_app" ; "space replaced")]
    #[test_case("mysql服务", "mysqlfuwu" ; "mixed")]
    #[test_case("café", "caf_" ; "non han letter replaced")]
    #[test_case("", "" ; "empty")]
    fn test_to_identifier(raw: &str, expected: &str) {
        assert_eq!(to_identifier(raw), expected);
    }

    #[test]
    fn test_identifier_chars_only() {
        let id = to_identifier("Ünïcode ✓ 服务 #1");
        assert!(id.chars().all(is_identifier_char), "{id}");
    }

    #[test_case("goodrain.me/percona-mysql:5.5_latest", "percona-mysql--5.5_latest" ; "registry image")]
    #[test_case("nginx", "nginx" ; "bare image")]
    #[test_case("/app_publish/vzrd9po6/v1.0_20180207165207.tgz", "v1.0_20180207165207.tgz" ; "slug path")]
    #[test_case("registry/ns/", "registry---ns---" ; "trailing slash")]
    #[test_case("my image:1 .0", "myimage--1.0" ; "whitespace dropped")]
    #[test_case("", "" ; "empty")]
    fn test_linux_file_name(reference: &str, expected: &str) {
        assert_eq!(linux_file_name(reference), expected);
    }
}
