//! Auxiliary per-candidate facts consulted by filter stages and the sorter
//! without loading the candidate itself.
//!
//! Facts live in a properties-style resource keyed `candidate.fact=value`.
//! The surface is advisory: a missing fact is `None`, never an error.

use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::manifest::parse_properties;

/// Fact name carrying ids the candidate must precede.
pub const FACT_BEFORE: &str = "before";
/// Fact name carrying ids the candidate must follow.
pub const FACT_AFTER: &str = "after";
/// Fact name carrying the numeric priority (lower runs first).
pub const FACT_PRIORITY: &str = "priority";

#[derive(Debug, Default)]
pub struct CandidateMetadata {
    facts: IndexMap<String, String>,
}

impl CandidateMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(source_name: &str, contents: &str) -> Result<Self, ResolveError> {
        let mut metadata = Self::default();
        for (key, value, _line) in parse_properties(source_name, contents)? {
            metadata.facts.insert(key, value);
        }
        Ok(metadata)
    }

    pub fn set(&mut self, candidate: &str, fact: &str, value: impl Into<String>) {
        self.facts.insert(format!("{candidate}.{fact}"), value.into());
    }

    pub fn get(&self, candidate: &str, fact: &str) -> Option<&str> {
        self.facts
            .get(&format!("{candidate}.{fact}"))
            .map(String::as_str)
    }

    pub fn get_list(&self, candidate: &str, fact: &str) -> Vec<&str> {
        self.get(candidate, fact)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_i32(&self, candidate: &str, fact: &str) -> Option<i32> {
        self.get(candidate, fact).and_then(|v| v.parse().ok())
    }

    /// Ids this candidate declares it runs before.
    pub fn before(&self, candidate: &str) -> Vec<&str> {
        self.get_list(candidate, FACT_BEFORE)
    }

    /// Ids this candidate declares it runs after.
    pub fn after(&self, candidate: &str) -> Vec<&str> {
        self.get_list(candidate, FACT_AFTER)
    }

    /// Numeric priority; unspecified means lowest priority.
    pub fn priority(&self, candidate: &str) -> i32 {
        self.get_i32(candidate, FACT_PRIORITY).unwrap_or(i32::MAX)
    }
}
