//! Min-conflicts local search: start from a random complete assignment and
//! iteratively repair a randomly chosen conflicted variable.
//!
//! Incomplete by design: it may fail on satisfiable instances, but is often
//! effective on large, loosely constrained problems.

use std::collections::{BTreeSet, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::solver::{
    constraint::{BinaryArc, NaryConstraint},
    problem::Problem,
    propagation::build_nary_index,
    solution::{Assignment, Value},
};

/// The customary step cap; callers pick their own budget per solve.
pub const DEFAULT_MAX_STEPS: usize = 1000;

/// Runs min-conflicts for up to `max_steps` repair iterations. Returns a
/// conflict-free complete assignment, or `None` when the step budget runs
/// out.
pub fn min_conflicts(
    problem: &Problem,
    max_steps: usize,
    rng: &mut impl Rng,
) -> Option<Assignment> {
    let arcs = problem.arcs();
    let constraints = problem.nary_constraints();
    let index = build_nary_index(constraints);
    // Arcs keyed by head: each binary constraint touching a variable appears
    // exactly once among the arcs headed at it.
    let mut head_arcs: HashMap<&str, Vec<usize>> = HashMap::new();
    for (id, arc) in arcs.iter().enumerate() {
        head_arcs.entry(arc.head.as_str()).or_default().push(id);
    }

    let mut current = Assignment::new();
    for name in problem.variable_order() {
        let domain = problem.domains().get(name).unwrap();
        let pick = rng.gen_range(0..domain.len());
        current.insert(name.clone(), domain[pick].clone());
    }

    for step in 0..max_steps {
        let conflicted = conflicted_variables(&current, arcs, constraints);
        if conflicted.is_empty() {
            debug!(step, "min-conflicts reached a conflict-free assignment");
            return Some(current);
        }
        let names: Vec<&String> = conflicted.iter().collect();
        let target = (*names.choose(rng).unwrap()).clone();

        let domain = problem.domains().get(&target).unwrap().clone();
        let mut best_values: Vec<Value> = Vec::new();
        let mut best_count = usize::MAX;
        for value in domain.iter() {
            let count = conflict_count(
                &target, value, &current, arcs, &head_arcs, constraints, &index,
            );
            if count < best_count {
                best_count = count;
                best_values.clear();
            }
            if count == best_count {
                best_values.push(value.clone());
            }
        }
        let repaired = best_values.choose(rng).unwrap().clone();
        current.insert(target, repaired);
    }

    debug!(max_steps, "min-conflicts exhausted its step budget");
    None
}

/// Every variable appearing in a currently violated constraint. Collected
/// into an ordered set so a seeded run is reproducible.
fn conflicted_variables(
    current: &Assignment,
    arcs: &[BinaryArc],
    constraints: &[NaryConstraint],
) -> BTreeSet<String> {
    let mut conflicted = BTreeSet::new();
    for arc in arcs {
        let head = current.get(&arc.head).unwrap();
        let tail = current.get(&arc.tail).unwrap();
        if !(arc.predicate)(head, tail) {
            // The mirrored arc collects the other endpoint.
            conflicted.insert(arc.head.clone());
        }
    }
    for constraint in constraints {
        if !constraint.is_satisfied_by(current) {
            for var in &constraint.vars {
                conflicted.insert(var.clone());
            }
        }
    }
    conflicted
}

/// The number of constraints violated if `variable` were set to `value`
/// while every other variable keeps its current value.
fn conflict_count(
    variable: &str,
    value: &Value,
    current: &Assignment,
    arcs: &[BinaryArc],
    head_arcs: &HashMap<&str, Vec<usize>>,
    constraints: &[NaryConstraint],
    index: &HashMap<String, Vec<usize>>,
) -> usize {
    let hypothetical = current.update(variable.to_string(), value.clone());
    let mut count = 0;
    if let Some(ids) = head_arcs.get(variable) {
        for &id in ids {
            let arc = &arcs[id];
            let head = hypothetical.get(&arc.head).unwrap();
            let tail = hypothetical.get(&arc.tail).unwrap();
            if !(arc.predicate)(head, tail) {
                count += 1;
            }
        }
    }
    if let Some(ids) = index.get(variable) {
        for &id in ids {
            if !constraints[id].is_satisfied_by(&hypothetical) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::solver::{problem::Problem, solution::Value};

    use super::*;

    #[test]
    fn unconstrained_problem_solves_immediately() {
        let mut problem = Problem::new();
        problem
            .add_variables(&["A", "B"], &Value::int_range(0..=3))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let solution = min_conflicts(&problem, 10, &mut rng).unwrap();
        assert_eq!(solution.len(), 2);
    }

    #[test]
    fn repairs_a_single_binary_conflict() {
        let mut problem = Problem::new();
        problem
            .add_variables(&["A", "B"], &Value::int_range(0..=2))
            .unwrap()
            .add_string_constraint("A != B")
            .unwrap();
        // Any conflicted state is one repair away from a solution.
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let solution = min_conflicts(&problem, 100, &mut rng).unwrap();
            assert_ne!(solution.get("A"), solution.get("B"));
        }
    }

    #[test]
    fn pigeonhole_exhausts_the_step_budget() {
        let mut problem = Problem::new();
        problem
            .add_variables(&["A", "B", "C"], &Value::int_range(1..=2))
            .unwrap()
            .add_all_different(&["A", "B", "C"])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(min_conflicts(&problem, 200, &mut rng).is_none());
    }

    #[test]
    fn returned_assignments_satisfy_every_constraint() {
        let mut problem = Problem::new();
        problem
            .add_variables(&["WA", "NT", "SA"], &Value::symbols(&["r", "g", "b"]))
            .unwrap()
            .add_string_constraint("WA != NT")
            .unwrap()
            .add_string_constraint("WA != SA")
            .unwrap()
            .add_string_constraint("NT != SA")
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        if let Some(solution) = min_conflicts(&problem, 1000, &mut rng) {
            for arc in problem.arcs() {
                let head = solution.get(&arc.head).unwrap();
                let tail = solution.get(&arc.tail).unwrap();
                assert!((arc.predicate)(head, tail));
            }
        }
    }
}
