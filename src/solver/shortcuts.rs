//! One-shot convenience entry points for callers that do not need to keep a
//! [`Problem`] around.

use crate::error::Result;
use crate::solver::{
    problem::Problem,
    solution::{Assignment, Value},
};

/// Builds and solves an all-different problem over one shared domain.
pub fn solve_all_different(names: &[&str], domain: &[Value]) -> Result<Option<Assignment>> {
    let mut problem = Problem::new();
    problem.add_variables(names, domain)?;
    problem.add_all_different(names)?;
    Ok(problem.solve())
}

/// Builds a problem from `(name, domain)` pairs and string constraints, and
/// solves it.
pub fn solve_string_constraints(
    variables: &[(&str, Vec<Value>)],
    constraints: &[&str],
) -> Result<Option<Assignment>> {
    let mut problem = Problem::new();
    for (name, domain) in variables {
        problem.add_variable(*name, domain.iter().cloned())?;
    }
    for expr in constraints {
        problem.add_string_constraint(expr)?;
    }
    Ok(problem.solve())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn one_shot_all_different() {
        let solution = solve_all_different(&["A", "B"], &Value::int_range(1..=2))
            .unwrap()
            .unwrap();
        assert_ne!(solution.get("A"), solution.get("B"));

        // Pigeonhole: three variables cannot share two values.
        let unsat = solve_all_different(&["A", "B", "C"], &Value::int_range(1..=2)).unwrap();
        assert!(unsat.is_none());
    }

    #[test]
    fn one_shot_string_constraints() {
        let solution = solve_string_constraints(
            &[
                ("A", Value::int_range(1..=3)),
                ("B", Value::int_range(1..=3)),
            ],
            &["A < B"],
        )
        .unwrap()
        .unwrap();
        assert_eq!(solution.get("A"), Some(&Value::int(1)));
        assert_eq!(solution.get("B"), Some(&Value::int(2)));
    }
}
