use std::sync::Arc;

use crate::solver::{constraint::NaryPredicate, solution::Assignment};

/// True iff all values present in the assignment are equal. Vacuously true
/// for an empty assignment.
pub fn all_equal() -> NaryPredicate {
    Arc::new(|assignment: &Assignment| {
        let mut values = assignment.values();
        match values.next() {
            None => true,
            Some(first) => values.all(|value| value == first),
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::solver::solution::Value;

    use super::*;

    #[test]
    fn vacuously_true_when_empty() {
        assert!(all_equal()(&Assignment::new()));
    }

    #[test]
    fn compares_structurally() {
        let p = all_equal();
        let same: Assignment = im::hashmap! {
            "A".to_string() => Value::symbol("red"),
            "B".to_string() => Value::symbol("red"),
        };
        assert!(p(&same));

        // Int(1) and Real(1.0) are distinct values.
        let mixed: Assignment = im::hashmap! {
            "A".to_string() => Value::int(1),
            "B".to_string() => Value::real(1.0),
        };
        assert!(!p(&mixed));
    }
}
