//! Making change for a dollar from quarters, dimes and nickels, expressed as
//! a single string constraint.

use crate::error::Result;
use crate::solver::{problem::Problem, solution::Value};

pub fn build_change_making() -> Result<Problem> {
    let mut problem = Problem::new();
    problem
        .add_variables(&["Q", "D", "N"], &Value::int_range(0..=20))?
        .add_string_constraint("25*Q + 10*D + 5*N == 100")?;
    Ok(problem)
}
