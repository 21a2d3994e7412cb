use std::collections::HashSet;
use std::sync::Arc;

use crate::solver::{constraint::NaryPredicate, solution::Assignment};

/// True iff the values present in the assignment are pairwise distinct.
///
/// Variables not yet assigned are ignored, so a partial assignment fails only
/// once two of its values actually collide.
pub fn all_different() -> NaryPredicate {
    Arc::new(|assignment: &Assignment| {
        let mut seen = HashSet::new();
        assignment.values().all(|value| seen.insert(value.clone()))
    })
}

#[cfg(test)]
mod tests {
    use crate::solver::solution::Value;

    use super::*;

    fn assignment(pairs: &[(&str, i64)]) -> Assignment {
        pairs
            .iter()
            .map(|(name, v)| (name.to_string(), Value::int(*v)))
            .collect()
    }

    #[test]
    fn rejects_duplicates() {
        let p = all_different();
        assert!(!p(&assignment(&[("A", 1), ("B", 1)])));
    }

    #[test]
    fn accepts_distinct_values() {
        let p = all_different();
        assert!(p(&assignment(&[("A", 1), ("B", 2), ("C", 3)])));
    }

    #[test]
    fn optimistic_on_partial_assignments() {
        let p = all_different();
        // Only one of the constraint's variables is bound yet.
        assert!(p(&assignment(&[("A", 1)])));
        assert!(p(&Assignment::new()));
        // A collision among the bound values is already definite.
        assert!(!p(&assignment(&[("A", 2), ("C", 2)])));
    }
}
