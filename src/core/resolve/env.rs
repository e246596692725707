//! Environment resolution
//!
//! Each component's environment is merged into an insertion-ordered map in
//! fixed phases, then `${KEY}` references are substituted against a snapshot
//! of the merged map, so the result never depends on iteration order.

use crate::domain::manifest::{ApplicationManifest, Component, GENERATED_VALUE_PLACEHOLDER};
use indexmap::{IndexMap, IndexSet};
use rand::Rng;
use regex::{Captures, Regex};

/// Key carrying the first declared container port
pub const PORT_KEY: &str = "PORT";

/// Key carrying the memory class label
pub const MEMORY_KEY: &str = "MEMORY_SIZE";

/// Memory class label for an allocation in MB; unknown sizes are `small`
pub fn memory_label(memory_mb: i64) -> &'static str {
    match memory_mb {
        128 => "micro",
        256 => "small",
        512 => "medium",
        1024 => "large",
        2048 => "2xlarge",
        4096 => "4xlarge",
        8192 => "8xlarge",
        16384 => "16xlarge",
        32768 => "32xlarge",
        65536 => "64xlarge",
        _ => "small",
    }
}

/// Fresh 8-character lowercase hex token
pub fn generate_token() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

/// Pattern for `${KEY}` references
pub fn reference_pattern() -> Regex {
    Regex::new(r"\$\{([^}]+)\}").expect("reference pattern is a valid regex")
}

/// Replaces every `${KEY}` in `value` with `env[KEY]`; unknown keys are left
/// as written
pub fn interpolate(value: &str, env: &IndexMap<String, String>, pattern: &Regex) -> String {
    pattern
        .replace_all(value, |caps: &Captures| match env.get(&caps[1]) {
            Some(resolved) => resolved.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Resolved environment of one component
///
/// Phases, later ones overriding earlier ones:
/// 1. `PORT` (first declared port) and `MEMORY_SIZE`
/// 2. private entries, with the placeholder replaced by a generated token
/// 3. public entries
/// 4. public entries of each dependency, in edge order, except keys the
///    component sets itself in phases 2 or 3
///
/// Finally every value has its `${KEY}` references substituted.
pub fn resolve_environment(
    component: &Component,
    manifest: &ApplicationManifest,
    pattern: &Regex,
) -> IndexMap<String, String> {
    let mut env: IndexMap<String, String> = IndexMap::new();

    if let Some(port) = component.ports.first() {
        env.insert(PORT_KEY.to_string(), port.to_string());
    }
    env.insert(
        MEMORY_KEY.to_string(),
        memory_label(component.memory).to_string(),
    );

    let mut own_keys: IndexSet<&str> = IndexSet::new();
    let mut tokens: IndexMap<&str, String> = IndexMap::new();

    for var in &component.private_env {
        let value = if var.value == GENERATED_VALUE_PLACEHOLDER {
            tokens
                .entry(var.name.as_str())
                .or_insert_with(generate_token)
                .clone()
        } else {
            var.value.clone()
        };
        env.insert(var.name.clone(), value);
        own_keys.insert(var.name.as_str());
    }

    for var in &component.public_env {
        env.insert(var.name.clone(), var.value.clone());
        own_keys.insert(var.name.as_str());
    }

    for edge in &component.dependencies {
        let Some(target) = manifest.component(&edge.target) else {
            continue;
        };
        for var in &target.public_env {
            if !own_keys.contains(var.name.as_str()) {
                env.insert(var.name.clone(), var.value.clone());
            }
        }
    }

    let snapshot = env.clone();
    for value in env.values_mut() {
        *value = interpolate(value, &snapshot, pattern);
    }

    env
}
