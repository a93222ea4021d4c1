//! Deterministic total ordering of surviving candidates from declared
//! before/after relationships and numeric priorities.

use indexmap::{IndexMap, IndexSet};

use crate::manifest::CandidateId;
use crate::metadata::CandidateMetadata;

/// Order `candidates` so that every "A before B" / "B after A" declaration
/// holds, with ties broken by ascending numeric priority and then by
/// first-seen order. Hints naming ids outside the candidate set are
/// ignored.
///
/// A cyclic constraint is not fatal: the first-seen member of a cycle is
/// released so the walk can continue, while nodes merely blocked behind
/// the cycle keep waiting on their edges. Partial order is preferred over
/// aborting.
pub fn sort_candidates(
    candidates: &[CandidateId],
    metadata: &CandidateMetadata,
) -> Vec<CandidateId> {
    let n = candidates.len();
    if n <= 1 {
        return candidates.to_vec();
    }

    let index: IndexMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    // Collect edges "from runs before to", deduplicated so a relationship
    // declared from both ends counts once.
    let mut edges: IndexSet<(usize, usize)> = IndexSet::new();
    for (i, candidate) in candidates.iter().enumerate() {
        for target in metadata.before(candidate) {
            if let Some(&j) = index.get(target) {
                if j != i {
                    edges.insert((i, j));
                }
            }
        }
        for target in metadata.after(candidate) {
            if let Some(&j) = index.get(target) {
                if j != i {
                    edges.insert((j, i));
                }
            }
        }
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for &(from, to) in &edges {
        successors[from].push(to);
        indegree[to] += 1;
    }

    let priority: Vec<i32> = candidates.iter().map(|c| metadata.priority(c)).collect();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while order.len() < n {
        let ready = (0..n)
            .filter(|&i| !placed[i] && indegree[i] == 0)
            .min_by_key(|&i| (priority[i], i));
        let next = match ready {
            Some(i) => i,
            None => {
                // Every unplaced node is part of, or blocked behind, a
                // cycle. Release the first-seen node that is actually on a
                // cycle so downstream edges keep holding.
                let blocked: Vec<usize> = (0..n).filter(|&i| !placed[i]).collect();
                let Some(&first) = blocked
                    .iter()
                    .find(|&&i| on_cycle(i, &placed, &successors))
                    .or(blocked.first())
                else {
                    break;
                };
                let members: Vec<&str> =
                    blocked.iter().map(|&i| candidates[i].as_str()).collect();
                log::debug!(
                    "ordering cycle among {members:?}; releasing '{}'",
                    candidates[first]
                );
                first
            }
        };
        placed[next] = true;
        order.push(next);
        for &succ in &successors[next] {
            if indegree[succ] > 0 {
                indegree[succ] -= 1;
            }
        }
    }

    order.into_iter().map(|i| candidates[i].clone()).collect()
}

/// Whether `start` can reach itself through unplaced successors.
fn on_cycle(start: usize, placed: &[bool], successors: &[Vec<usize>]) -> bool {
    let mut stack = vec![start];
    let mut visited = vec![false; placed.len()];
    while let Some(node) = stack.pop() {
        for &succ in &successors[node] {
            if placed[succ] {
                continue;
            }
            if succ == start {
                return true;
            }
            if !visited[succ] {
                visited[succ] = true;
                stack.push(succ);
            }
        }
    }
    false
}
