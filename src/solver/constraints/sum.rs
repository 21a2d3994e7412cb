//! Weighted-sum constraints: `Σ mᵢ·vᵢ` compared against a fixed target or a
//! sum variable.

use std::sync::Arc;

use crate::solver::{constraint::NaryPredicate, solution::Assignment};

/// Tolerance for exact comparisons once values have passed through `f64`.
pub(crate) const EXACT_TOLERANCE: f64 = 1e-9;

/// Offset applied to a bound to express a strict inequality.
pub(crate) const STRICT_EPSILON: f64 = 1e-9;

/// All variables weighted 1, for the unweighted helpers.
pub(crate) fn unit_terms(vars: &[String]) -> Vec<(String, f64)> {
    vars.iter().map(|v| (v.clone(), 1.0)).collect()
}

enum Total {
    Complete(f64),
    Missing,
    NonNumeric,
}

fn weighted_total(terms: &[(String, f64)], assignment: &Assignment) -> Total {
    let mut total = 0.0;
    for (var, multiplier) in terms {
        match assignment.get(var) {
            None => return Total::Missing,
            Some(value) => match value.as_f64() {
                None => return Total::NonNumeric,
                Some(v) => total += multiplier * v,
            },
        }
    }
    Total::Complete(total)
}

fn sum_predicate(
    terms: Vec<(String, f64)>,
    check: impl Fn(f64) -> bool + Send + Sync + 'static,
) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| match weighted_total(&terms, assignment) {
        Total::Missing => true,
        Total::NonNumeric => false,
        Total::Complete(total) => check(total),
    })
}

/// True iff `Σ mᵢ·vᵢ == target` (within tolerance).
pub fn exact_sum(terms: Vec<(String, f64)>, target: f64) -> NaryPredicate {
    sum_predicate(terms, move |total| (total - target).abs() <= EXACT_TOLERANCE)
}

/// True iff `Σ mᵢ·vᵢ >= target`.
pub fn min_sum(terms: Vec<(String, f64)>, target: f64) -> NaryPredicate {
    sum_predicate(terms, move |total| total >= target)
}

/// True iff `Σ mᵢ·vᵢ <= target`.
pub fn max_sum(terms: Vec<(String, f64)>, target: f64) -> NaryPredicate {
    sum_predicate(terms, move |total| total <= target)
}

/// True iff the weighted sum lies between `low` and `high`, with per-bound
/// strictness.
pub fn sum_in_range(
    terms: Vec<(String, f64)>,
    low: f64,
    high: f64,
    low_strict: bool,
    high_strict: bool,
) -> NaryPredicate {
    sum_predicate(terms, move |total| {
        let above = if low_strict { total > low } else { total >= low };
        let below = if high_strict { total < high } else { total <= high };
        above && below
    })
}

/// True iff `Σ terms == value(total_var)`, where the sum target is itself a
/// variable of the constraint.
pub fn variable_sum(terms: Vec<String>, total_var: String) -> NaryPredicate {
    let terms = unit_terms(&terms);
    Arc::new(move |assignment: &Assignment| {
        let target = match assignment.get(&total_var) {
            None => return true,
            Some(value) => match value.as_f64() {
                None => return false,
                Some(v) => v,
            },
        };
        match weighted_total(&terms, assignment) {
            Total::Missing => true,
            Total::NonNumeric => false,
            Total::Complete(total) => (total - target).abs() <= EXACT_TOLERANCE,
        }
    })
}
