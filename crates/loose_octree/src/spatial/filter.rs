//! Post-filters for query results

use super::Handle;

/// Keep only candidates that are not an ancestor of another candidate.
///
/// A ray that passes through a child object also passes through every
/// container enclosing it, and the index cannot tell those apart spatially.
/// `is_ancestor(a, b)` reports whether `a` contains `b` in the caller's own
/// hierarchy. Cost is O(n²) in `candidates.len()`, so only apply this to the
/// small result sets of a single query.
pub fn retain_innermost<H, F>(candidates: &mut Vec<H>, is_ancestor: F)
where
    H: Handle,
    F: Fn(&H, &H) -> bool,
{
    let snapshot = candidates.clone();
    candidates.retain(|candidate| {
        !snapshot
            .iter()
            .any(|other| other != candidate && is_ancestor(candidate, other))
    });
}
