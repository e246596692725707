//! Image reference parsing
//!
//! Just enough of the `[registry/]path[:tag][@digest]` grammar to derive
//! registry hosts for login and flattened transfer names.

use std::fmt;

/// Tag assumed when a reference carries neither tag nor digest
pub const DEFAULT_TAG: &str = "latest";

/// A parsed image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, when the first path segment names one
    pub registry: Option<String>,
    /// Repository path below the registry, e.g. `library/mysql`
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        let (name, digest) = match raw.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (raw, None),
        };

        // A ':' after the last '/' is a tag, before it a registry port
        let last_slash = name.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (path, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        let (registry, repository) = match path.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => {
                (Some(first.to_string()), rest.to_string())
            }
            _ => (None, path.to_string()),
        };

        Self {
            registry,
            repository,
            tag: tag.filter(|t| !t.is_empty()),
            digest,
        }
    }

    /// Last repository path segment, e.g. `mysql` for `library/mysql`
    pub fn short_name(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// Transfer-safe name under `domain`
    ///
    /// Digests are kept verbatim; otherwise the tag defaults to `latest`.
    pub fn flattened(&self, domain: &str) -> String {
        let domain = domain.trim_end_matches('/');
        match (&self.digest, &self.tag) {
            (Some(digest), _) => format!("{}/{}@{}", domain, self.short_name(), digest),
            (None, Some(tag)) => format!("{}/{}:{}", domain, self.short_name(), tag),
            (None, None) => format!("{}/{}:{}", domain, self.short_name(), DEFAULT_TAG),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("mysql", None, "mysql", None; "bare name")]
    #[test_case("library/mysql:5.7", None, "library/mysql", Some("5.7"); "hub path with tag")]
    #[test_case("hub.example.com/team/web:1.2", Some("hub.example.com"), "team/web", Some("1.2"); "registry")]
    #[test_case("localhost:5000/web", Some("localhost:5000"), "web", None; "registry port no tag")]
    #[test_case("localhost:5000/web:dev", Some("localhost:5000"), "web", Some("dev"); "registry port with tag")]
    fn test_parse(raw: &str, registry: Option<&str>, repository: &str, tag: Option<&str>) {
        let parsed = ImageReference::parse(raw);
        assert_eq!(parsed.registry.as_deref(), registry);
        assert_eq!(parsed.repository, repository);
        assert_eq!(parsed.tag.as_deref(), tag);
        assert_eq!(parsed.to_string(), raw);
    }

    #[test_case("hub.example.com/team/web:1.2", "goodrain.me/web:1.2")]
    #[test_case("mysql", "goodrain.me/mysql:latest")]
    #[test_case("goodrain.me/runner", "goodrain.me/runner:latest")]
    #[test_case("hub.example.com/web@sha256:abcd", "goodrain.me/web@sha256:abcd")]
    fn test_flattened(raw: &str, expected: &str) {
        assert_eq!(ImageReference::parse(raw).flattened("goodrain.me/"), expected);
    }
}
