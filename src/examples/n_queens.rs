//! N-queens: one queen per column, held apart along rows and diagonals.

use crate::error::Result;
use crate::solver::{constraint::ConstraintPredicate, problem::Problem, solution::Value};

/// Builds the n-queens problem: `Q1..Qn` hold the row (1-based) of the queen
/// in each column.
pub fn build_n_queens(n: usize) -> Result<Problem> {
    let names: Vec<String> = (1..=n).map(|i| format!("Q{}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(|name| name.as_str()).collect();

    let mut problem = Problem::new();
    problem.add_variables(&name_refs, &Value::int_range(1..=n as i64))?;
    problem.add_all_different(&name_refs)?;

    for i in 0..n {
        for j in (i + 1)..n {
            let column_gap = Value::int((j - i) as i64);
            problem.add_constraint(
                &[name_refs[i], name_refs[j]],
                ConstraintPredicate::binary(move |a, b| {
                    match a.checked_sub(b).and_then(|diff| diff.abs()) {
                        Some(row_gap) => row_gap != column_gap,
                        None => false,
                    }
                }),
            )?;
        }
    }
    Ok(problem)
}
