//! The 3×3 magic square: cells 1..9, all different, every row, column and
//! diagonal summing to 15. Pinning the centre to 5 leaves the eight
//! rotations and reflections of the classic square.

use crate::error::Result;
use crate::solver::{problem::Problem, solution::Value};

/// Cell names, row by row.
pub const CELLS: [&str; 9] = ["C11", "C12", "C13", "C21", "C22", "C23", "C31", "C32", "C33"];

/// The eight lines that must each sum to 15.
pub const LINES: [[&str; 3]; 8] = [
    ["C11", "C12", "C13"],
    ["C21", "C22", "C23"],
    ["C31", "C32", "C33"],
    ["C11", "C21", "C31"],
    ["C12", "C22", "C32"],
    ["C13", "C23", "C33"],
    ["C11", "C22", "C33"],
    ["C13", "C22", "C31"],
];

/// Builds the square with the centre pinned to 5.
pub fn build_magic_square() -> Result<Problem> {
    let mut problem = Problem::new();
    for cell in CELLS {
        if cell == "C22" {
            problem.add_variable(cell, vec![Value::int(5)])?;
        } else {
            problem.add_variable(cell, Value::int_range(1..=9))?;
        }
    }
    problem.add_all_different(&CELLS)?;
    for line in LINES {
        problem.add_exact_sum(&line, 15.0)?;
    }
    Ok(problem)
}
