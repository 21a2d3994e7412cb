//! Set-membership constraints.

use std::collections::HashSet;
use std::sync::Arc;

use crate::solver::{
    constraint::NaryPredicate,
    solution::{Assignment, Value},
};

/// True iff every assigned value is a member of `set`.
pub fn in_set(set: HashSet<Value>) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| {
        assignment.values().all(|value| set.contains(value))
    })
}

/// True iff no assigned value is a member of `set`.
pub fn not_in_set(set: HashSet<Value>) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| {
        assignment.values().all(|value| !set.contains(value))
    })
}

/// True iff at least `k` of the constraint's `arity` variables can still take
/// a value in `set`: definite violation only once the members present plus
/// the variables still unbound cannot reach `k`.
pub fn some_in_set(arity: usize, set: HashSet<Value>, k: usize) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| {
        let members = assignment.values().filter(|v| set.contains(*v)).count();
        let unbound = arity.saturating_sub(assignment.len());
        members + unbound >= k
    })
}

/// True iff at least `k` of the constraint's `arity` variables can still take
/// a value outside `set`.
pub fn some_not_in_set(arity: usize, set: HashSet<Value>, k: usize) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| {
        let outsiders = assignment.values().filter(|v| !set.contains(*v)).count();
        let unbound = arity.saturating_sub(assignment.len());
        outsiders + unbound >= k
    })
}
