//! Share identifier to service name registry
//!
//! Built once per export, in a single pass over every component, before any
//! directory or descriptor work. Everything that needs a component's name on
//! disk or in the descriptor asks the registry.

use super::sanitize::to_identifier;
use crate::domain::ids::ShareId;
use crate::domain::manifest::Component;
use indexmap::{IndexMap, IndexSet};
use rand::Rng;

/// Fallback for names that sanitize to nothing
const EMPTY_NAME_FALLBACK: &str = "component";

/// Unique, identifier-safe name per component
#[derive(Debug, Clone, Default)]
pub struct ServiceNameRegistry {
    names: IndexMap<ShareId, String>,
}

impl ServiceNameRegistry {
    /// Builds the registry from components in manifest order
    ///
    /// A name already taken by an earlier component gets `-xxxx` (four random
    /// hex digits) appended.
    pub fn build(components: &[Component]) -> Self {
        Self::build_with(components, random_suffix)
    }

    /// Builds the registry with a caller-supplied suffix generator
    pub fn build_with(components: &[Component], mut suffix: impl FnMut() -> String) -> Self {
        let mut names = IndexMap::with_capacity(components.len());
        let mut taken: IndexSet<String> = IndexSet::with_capacity(components.len());

        for component in components {
            if names.contains_key(&component.share_id) {
                tracing::warn!(
                    share_id = %component.share_id,
                    component = %component.display_name,
                    "Duplicate share identifier, keeping the first component's name"
                );
                continue;
            }

            let mut base = to_identifier(&component.display_name);
            if base.is_empty() {
                base = EMPTY_NAME_FALLBACK.to_string();
            }

            let mut name = base.clone();
            while taken.contains(&name) {
                name = format!("{}-{}", base, suffix());
            }

            if name != base {
                tracing::debug!(base = %base, name = %name, "Service name collision resolved");
            }
            taken.insert(name.clone());
            names.insert(component.share_id.clone(), name);
        }

        Self { names }
    }

    /// Sanitized name for a share identifier
    pub fn name(&self, share_id: &ShareId) -> Option<&str> {
        self.names.get(share_id).map(String::as_str)
    }

    /// Whether the share identifier belongs to a registered component
    pub fn contains(&self, share_id: &ShareId) -> bool {
        self.names.contains_key(share_id)
    }

    /// Registered names in manifest order
    pub fn iter(&self) -> impl Iterator<Item = (&ShareId, &str)> {
        self.names.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn random_suffix() -> String {
    format!("{:04x}", rand::thread_rng().gen::<u16>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::sanitize::is_identifier_char;
    use regex::Regex;

    fn component(name: &str, share_id: &str) -> Component {
        Component {
            display_name: name.to_string(),
            share_id: ShareId::new(share_id),
            image: Some("nginx:latest".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_names_get_distinct_keys() {
        let components = vec![component("测试", "a"), component("测试", "b")];
        let registry = ServiceNameRegistry::build(&components);

        let first = registry.name(&ShareId::new("a")).unwrap();
        let second = registry.name(&ShareId::new("b")).unwrap();

        assert_eq!(first, "ceshi");
        assert_ne!(first, second);
        let suffixed = Regex::new(r"^ceshi-[0-9a-f]{4}$").unwrap();
        assert!(suffixed.is_match(second), "{second}");
        assert!(second.chars().all(is_identifier_char));
    }

    #[test]
    fn test_escaped_and_literal_names_collide() {
        let components = vec![
            component("\\u6d4b\\u8bd5", "a"),
            component("测试", "b"),
        ];
        let registry = ServiceNameRegistry::build(&components);
        assert_eq!(registry.name(&ShareId::new("a")), Some("ceshi"));
        assert!(registry.name(&ShareId::new("b")).unwrap().starts_with("ceshi-"));
    }

    #[test]
    fn test_suffix_retried_until_unique() {
        let components = vec![
            component("web", "a"),
            component("web", "b"),
            component("web", "c"),
        ];
        let mut calls = vec!["0001", "0001", "0002"].into_iter();
        let registry =
            ServiceNameRegistry::build_with(&components, || calls.next().unwrap().to_string());

        assert_eq!(registry.name(&ShareId::new("a")), Some("web"));
        assert_eq!(registry.name(&ShareId::new("b")), Some("web-0001"));
        assert_eq!(registry.name(&ShareId::new("c")), Some("web-0002"));
    }

    #[test]
    fn test_empty_name_falls_back() {
        let registry = ServiceNameRegistry::build(&[component("   ", "a")]);
        assert_eq!(registry.name(&ShareId::new("a")), Some("component"));
    }

    #[test]
    fn test_order_preserved() {
        let components = vec![component("b", "2"), component("a", "1")];
        let registry = ServiceNameRegistry::build(&components);
        let names: Vec<&str> = registry.iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(&ShareId::new("3")));
    }
}
