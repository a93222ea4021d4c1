//! Candidate resolution core: manifest-driven discovery, exclusion,
//! advisory filtering, and deterministic ordering of optional modules.

pub mod error;
pub mod exclude;
pub mod filter;
pub mod group;
pub mod manifest;
pub mod metadata;
pub mod registry;
pub mod sort;

pub use error::ResolveError;
pub use exclude::{compute_exclusions, validate_exclusions};
pub use filter::{CandidateFilter, RequireRegisteredFilter, apply_filters};
pub use group::{
    ResolutionEntry, ResolutionGroup, ResolutionRequest, Resolver, SelectedCandidate,
};
pub use manifest::{CandidateId, CandidateManifest, CandidateRegistry, ManifestSource};
pub use metadata::{CandidateMetadata, FACT_AFTER, FACT_BEFORE, FACT_PRIORITY};
pub use registry::{Factory, FactoryRegistry, Resolvable};
pub use sort::sort_candidates;
