//! Per-request resolution and the deferred group that merges independent
//! requests against a shared candidate universe.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::ResolveError;
use crate::exclude::{compute_exclusions, validate_exclusions};
use crate::filter::{CandidateFilter, apply_filters};
use crate::manifest::{CandidateId, CandidateRegistry};
use crate::metadata::CandidateMetadata;
use crate::registry::Resolvable;
use crate::sort::sort_candidates;

/// One caller's view of the selection: exclusion declarations plus an
/// opaque origin token used to re-attach results to the requester.
#[derive(Debug, Clone, Default)]
pub struct ResolutionRequest {
    pub origin: String,
    pub excludes: Vec<String>,
    pub exclude_names: Vec<String>,
    pub environment_excludes: Vec<String>,
}

impl ResolutionRequest {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn exclude(mut self, id: impl Into<String>) -> Self {
        self.excludes.push(id.into());
        self
    }

    pub fn exclude_name(mut self, name: impl Into<String>) -> Self {
        self.exclude_names.push(name.into());
        self
    }
}

/// Immutable result of resolving one request. Exclusions already applied;
/// `exclusions ∩ configurations = ∅` holds by construction.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionEntry {
    origin: String,
    configurations: Vec<CandidateId>,
    exclusions: IndexSet<String>,
}

impl ResolutionEntry {
    pub fn new(
        origin: impl Into<String>,
        mut configurations: Vec<CandidateId>,
        exclusions: IndexSet<String>,
    ) -> Self {
        configurations.retain(|c| !exclusions.contains(c.as_str()));
        Self {
            origin: origin.into(),
            configurations,
            exclusions,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn configurations(&self) -> &[CandidateId] {
        &self.configurations
    }

    pub fn exclusions(&self) -> &IndexSet<String> {
        &self.exclusions
    }
}

/// Resolves one request against the candidate universe: load, dedup,
/// exclude (validated), then run the filter stages.
pub struct Resolver {
    registry: Arc<CandidateRegistry>,
    capability: String,
    known: Arc<dyn Resolvable + Send + Sync>,
    metadata: Arc<CandidateMetadata>,
    filters: Vec<Box<dyn CandidateFilter>>,
}

impl Resolver {
    pub fn new(
        registry: Arc<CandidateRegistry>,
        capability: impl Into<String>,
        known: Arc<dyn Resolvable + Send + Sync>,
        metadata: Arc<CandidateMetadata>,
    ) -> Self {
        Self {
            registry,
            capability: capability.into(),
            known,
            metadata,
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<Box<dyn CandidateFilter>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn push_filter(&mut self, filter: Box<dyn CandidateFilter>) {
        self.filters.push(filter);
    }

    pub fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionEntry, ResolveError> {
        let candidates = self.registry.load_required(&self.capability)?;
        let mut configurations: Vec<CandidateId> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !configurations.iter().any(|c| c == candidate) {
                configurations.push(candidate.clone());
            }
        }
        let exclusions = compute_exclusions(
            &request.excludes,
            &request.exclude_names,
            &request.environment_excludes,
        );
        validate_exclusions(&configurations, &exclusions, self.known.as_ref())?;
        configurations.retain(|c| !exclusions.contains(c.as_str()));
        let configurations = apply_filters(configurations, &self.filters, &self.metadata)?;
        log::debug!(
            "request '{}' resolved {} candidate(s), {} exclusion(s)",
            request.origin,
            configurations.len(),
            exclusions.len()
        );
        Ok(ResolutionEntry::new(
            request.origin.clone(),
            configurations,
            exclusions,
        ))
    }
}

/// One selected candidate with the origin of whichever request first
/// introduced it (diagnostics only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedCandidate {
    pub candidate: CandidateId,
    pub origin: String,
}

/// Collects the entries of N independent requests. `select` merges them:
/// the union of configurations minus the union of exclusions, so exclusion
/// from any request dominates inclusion by another, then one sorter pass.
#[derive(Default)]
pub struct ResolutionGroup {
    entries: Vec<ResolutionEntry>,
    origins: IndexMap<CandidateId, String>,
}

impl ResolutionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, entry: ResolutionEntry) {
        for candidate in entry.configurations() {
            self.origins
                .entry(candidate.clone())
                .or_insert_with(|| entry.origin().to_string());
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ResolutionEntry] {
        &self.entries
    }

    /// Union of every entry's exclusions, first-seen order.
    pub fn exclusions(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        for entry in &self.entries {
            for id in entry.exclusions() {
                out.insert(id.clone());
            }
        }
        out
    }

    pub fn select(&self, metadata: &CandidateMetadata) -> Vec<SelectedCandidate> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let exclusions = self.exclusions();
        let mut merged: IndexSet<CandidateId> = IndexSet::new();
        for entry in &self.entries {
            for candidate in entry.configurations() {
                merged.insert(candidate.clone());
            }
        }
        merged.retain(|c| !exclusions.contains(c.as_str()));
        let merged: Vec<CandidateId> = merged.into_iter().collect();
        sort_candidates(&merged, metadata)
            .into_iter()
            .map(|candidate| {
                let origin = self
                    .origins
                    .get(&candidate)
                    .cloned()
                    .unwrap_or_default();
                SelectedCandidate { candidate, origin }
            })
            .collect()
    }
}
