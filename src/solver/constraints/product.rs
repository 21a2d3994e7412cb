//! Product constraints over a set of variables. The empty product is 1.

use std::sync::Arc;

use crate::solver::{
    constraint::NaryPredicate,
    constraints::sum::EXACT_TOLERANCE,
    solution::Assignment,
};

enum Total {
    Complete(f64),
    Missing,
    NonNumeric,
}

fn product_total(vars: &[String], assignment: &Assignment) -> Total {
    let mut total = 1.0;
    for var in vars {
        match assignment.get(var) {
            None => return Total::Missing,
            Some(value) => match value.as_f64() {
                None => return Total::NonNumeric,
                Some(v) => total *= v,
            },
        }
    }
    Total::Complete(total)
}

fn product_predicate(
    vars: Vec<String>,
    check: impl Fn(f64) -> bool + Send + Sync + 'static,
) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| match product_total(&vars, assignment) {
        Total::Missing => true,
        Total::NonNumeric => false,
        Total::Complete(total) => check(total),
    })
}

/// True iff `Π vᵢ == target` (within tolerance).
pub fn exact_product(vars: Vec<String>, target: f64) -> NaryPredicate {
    product_predicate(vars, move |total| (total - target).abs() <= EXACT_TOLERANCE)
}

/// True iff `Π vᵢ >= target`.
pub fn min_product(vars: Vec<String>, target: f64) -> NaryPredicate {
    product_predicate(vars, move |total| total >= target)
}

/// True iff `Π vᵢ <= target`.
pub fn max_product(vars: Vec<String>, target: f64) -> NaryPredicate {
    product_predicate(vars, move |total| total <= target)
}

/// True iff `Π terms == value(total_var)`.
pub fn variable_product(terms: Vec<String>, total_var: String) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| {
        let target = match assignment.get(&total_var) {
            None => return true,
            Some(value) => match value.as_f64() {
                None => return false,
                Some(v) => v,
            },
        };
        match product_total(&terms, assignment) {
            Total::Missing => true,
            Total::NonNumeric => false,
            Total::Complete(total) => (total - target).abs() <= EXACT_TOLERANCE,
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::solver::solution::Value;

    use super::*;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn assignment(pairs: &[(&str, i64)]) -> Assignment {
        pairs
            .iter()
            .map(|(name, v)| (name.to_string(), Value::int(*v)))
            .collect()
    }

    #[test]
    fn exact_product_checks_complete_assignments() {
        let p = exact_product(vars(&["A", "B"]), 12.0);
        assert!(p(&assignment(&[("A", 3), ("B", 4)])));
        assert!(!p(&assignment(&[("A", 3), ("B", 5)])));
        // Partial assignments stay optimistic.
        assert!(p(&assignment(&[("A", 3)])));
    }

    #[test]
    fn empty_product_is_one() {
        let p = exact_product(vec![], 1.0);
        assert!(p(&Assignment::new()));
    }

    #[test]
    fn bounds_compare_the_product() {
        let lo = min_product(vars(&["A", "B"]), 10.0);
        assert!(lo(&assignment(&[("A", 5), ("B", 2)])));
        assert!(!lo(&assignment(&[("A", 3), ("B", 3)])));

        let hi = max_product(vars(&["A", "B"]), 10.0);
        assert!(hi(&assignment(&[("A", 3), ("B", 3)])));
        assert!(!hi(&assignment(&[("A", 5), ("B", 3)])));
    }
}
