//! Advisory filter stages: pluggable predicates that can veto candidates
//! based on auxiliary metadata without loading the candidate itself.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::manifest::CandidateId;
use crate::metadata::CandidateMetadata;
use crate::registry::Resolvable;

/// One filter stage. `matches` receives the current surviving candidate
/// array (already-vetoed slots are `None`) and returns one boolean per
/// original index; `true` retains the candidate.
pub trait CandidateFilter: Send + Sync {
    fn name(&self) -> &str;

    fn matches(
        &self,
        candidates: &[Option<&str>],
        metadata: &CandidateMetadata,
    ) -> Result<Vec<bool>, ResolveError>;
}

/// Run `filters` in order over `candidates`. A candidate vetoed by any
/// stage has its slot nulled before later stages run and is never
/// reconsidered. A stage failure propagates immediately; no partial result
/// is used.
pub fn apply_filters(
    candidates: Vec<CandidateId>,
    filters: &[Box<dyn CandidateFilter>],
    metadata: &CandidateMetadata,
) -> Result<Vec<CandidateId>, ResolveError> {
    if filters.is_empty() || candidates.is_empty() {
        return Ok(candidates);
    }
    let mut slots: Vec<Option<&str>> = candidates.iter().map(|c| Some(c.as_str())).collect();
    let mut vetoed = false;
    for filter in filters {
        let outcome = filter.matches(&slots, metadata)?;
        if outcome.len() != slots.len() {
            return Err(ResolveError::Filter {
                filter: filter.name().to_string(),
                reason: format!(
                    "returned {} outcomes for {} candidates",
                    outcome.len(),
                    slots.len()
                ),
            });
        }
        for (slot, keep) in slots.iter_mut().zip(&outcome) {
            if !keep && slot.is_some() {
                *slot = None;
                vetoed = true;
            }
        }
    }
    if !vetoed {
        return Ok(candidates);
    }
    let retained: Vec<CandidateId> = slots
        .iter()
        .enumerate()
        .filter_map(|(idx, slot)| slot.map(|_| candidates[idx].clone()))
        .collect();
    log::trace!(
        "filter stages vetoed {} of {} candidate(s)",
        candidates.len() - retained.len(),
        candidates.len()
    );
    Ok(retained)
}

/// Built-in stage: veto candidates whose `requires` fact names identifiers
/// absent from the factory registry. Candidates with no `requires` fact
/// pass through (best-effort: a missing auxiliary fact is not an error).
pub struct RequireRegisteredFilter {
    known: Arc<dyn Resolvable + Send + Sync>,
}

impl RequireRegisteredFilter {
    pub fn new(known: Arc<dyn Resolvable + Send + Sync>) -> Self {
        Self { known }
    }
}

impl CandidateFilter for RequireRegisteredFilter {
    fn name(&self) -> &str {
        "require-registered"
    }

    fn matches(
        &self,
        candidates: &[Option<&str>],
        metadata: &CandidateMetadata,
    ) -> Result<Vec<bool>, ResolveError> {
        Ok(candidates
            .iter()
            .map(|slot| match slot {
                Some(candidate) => metadata
                    .get_list(candidate, "requires")
                    .iter()
                    .all(|id| self.known.is_resolvable(id)),
                None => true,
            })
            .collect())
    }
}
