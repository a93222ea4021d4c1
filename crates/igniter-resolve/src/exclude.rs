//! Explicit exclusion: a user contract validated precisely, as opposed to
//! the advisory filtering in [`crate::filter`].

use indexmap::IndexSet;

use crate::error::ResolveError;
use crate::manifest::CandidateId;
use crate::registry::Resolvable;

/// Union of the three exclusion sources, preserving first-seen order.
/// No conflict detection happens here.
pub fn compute_exclusions(
    excludes: &[String],
    exclude_names: &[String],
    environment_excludes: &[String],
) -> IndexSet<String> {
    let mut out = IndexSet::new();
    for id in excludes.iter().chain(exclude_names).chain(environment_excludes) {
        out.insert(id.clone());
    }
    out
}

/// Reject excludes that name a resolvable identifier which was never a
/// candidate, which is a configuration mistake. Excludes the loader cannot
/// resolve
/// at all pass silently; they are assumed to belong to a different module
/// set. All offenders are reported in one diagnostic.
pub fn validate_exclusions(
    candidates: &[CandidateId],
    exclusions: &IndexSet<String>,
    resolvable: &dyn Resolvable,
) -> Result<(), ResolveError> {
    let invalid: Vec<String> = exclusions
        .iter()
        .filter(|id| resolvable.is_resolvable(id) && !candidates.iter().any(|c| c == *id))
        .cloned()
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ResolveError::InvalidExcludes(invalid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(ids: &[&str]) -> IndexSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn union_preserves_first_seen_order() {
        let merged = compute_exclusions(
            &strings(&["a", "b"]),
            &strings(&["b", "c"]),
            &strings(&["a", "d"]),
        );
        let merged: Vec<&str> = merged.iter().map(String::as_str).collect();
        assert_eq!(merged, ["a", "b", "c", "d"]);
    }

    #[test]
    fn unresolvable_excludes_pass_silently() {
        let candidates = strings(&["a", "b"]);
        let exclusions = compute_exclusions(&strings(&["ghost"]), &[], &[]);
        validate_exclusions(&candidates, &exclusions, &known(&["a", "b"])).expect("ok");
    }

    #[test]
    fn resolvable_non_candidate_excludes_fail_listing_each() {
        let candidates = strings(&["a"]);
        let exclusions = compute_exclusions(&strings(&["b", "ghost", "c"]), &[], &[]);
        let err = validate_exclusions(&candidates, &exclusions, &known(&["a", "b", "c"]))
            .expect_err("invalid");
        match err {
            ResolveError::InvalidExcludes(ids) => assert_eq!(ids, strings(&["b", "c"])),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn excluding_an_actual_candidate_is_valid() {
        let candidates = strings(&["a", "b"]);
        let exclusions = compute_exclusions(&strings(&["b"]), &[], &[]);
        validate_exclusions(&candidates, &exclusions, &known(&["a", "b"])).expect("ok");
    }
}
