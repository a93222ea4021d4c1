//! Process environment abstraction consumed by the bootstrap sequence.
//!
//! An ordered property map; the external collaborator (config binding,
//! file formats) populates it before `run`. `from_process` captures the
//! process environment with `MODULES_EXCLUDE`-style names normalized to
//! `modules.exclude`.

use indexmap::IndexMap;

/// Well-known property key holding the environment-declared exclusion
/// list (comma-separated).
pub const EXCLUDE_KEY: &str = "modules.exclude";

#[derive(Debug, Clone, Default)]
pub struct Environment {
    properties: IndexMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment, lowercasing variable names
    /// and mapping `_` to `.` so `MODULES_EXCLUDE` surfaces as
    /// `modules.exclude`.
    pub fn from_process() -> Self {
        let mut env = Self::new();
        for (key, value) in std::env::vars() {
            env.properties
                .insert(key.to_lowercase().replace('_', "."), value);
        }
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Comma-separated list value; absent key yields an empty list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The environment-declared exclusion list under [`EXCLUDE_KEY`].
    pub fn exclusions(&self) -> Vec<String> {
        self.get_list(EXCLUDE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_values_are_split_and_trimmed() {
        let mut env = Environment::new();
        env.set(EXCLUDE_KEY, "a , b,,c");
        assert_eq!(env.exclusions(), ["a", "b", "c"]);
    }

    #[test]
    fn absent_keys_yield_empty_lists() {
        let env = Environment::new();
        assert!(env.get("anything").is_none());
        assert!(env.exclusions().is_empty());
    }

    #[test]
    fn later_sets_override_earlier_values() {
        let mut env = Environment::new();
        env.set("key", "first");
        env.set("key", "second");
        assert_eq!(env.get("key"), Some("second"));
    }
}
