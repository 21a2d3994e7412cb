//! Quandary is a general-purpose constraint satisfaction problem (CSP)
//! solver.
//!
//! A problem is a set of named variables, each with a finite discrete domain
//! of candidate [`Value`]s, plus constraints restricting which combinations
//! of values are admissible. The library finds one solution, lazily
//! enumerates all of them, or reports unsolvability.
//!
//! # Core Concepts
//!
//! - **[`Problem`]**: the model and its fluent builder. Variables and
//!   domains go in, constraints are attached as predicate objects, built-in
//!   factory helpers (`add_all_different`, `add_exact_sum`, ...) or parsed
//!   strings (`add_string_constraint("A + B == C")`).
//! - **Systematic search**: depth-first backtracking with forward-checking
//!   (AC-3 over binary arcs, generalized arc consistency over n-ary
//!   constraints), variable selection by minimum remaining values with a
//!   degree tie-break, and least-constraining-value ordering. Deterministic:
//!   the same problem always enumerates solutions in the same order.
//! - **Min-conflicts**: a randomized local-search alternative over complete
//!   assignments, effective on large, loosely constrained problems.
//!
//! # Example
//!
//! ```
//! use quandary::error::Result;
//! use quandary::solver::{problem::Problem, solution::Value};
//!
//! fn main() -> Result<()> {
//!     let mut problem = Problem::new();
//!     problem
//!         .add_variables(&["A", "B"], &Value::int_range(1..=3))?
//!         .add_string_constraint("A < B")?;
//!
//!     // The deterministic enumeration starts at (1, 2).
//!     let solution = problem.solve().expect("satisfiable");
//!     assert_eq!(solution.get("A"), Some(&Value::int(1)));
//!     assert_eq!(solution.get("B"), Some(&Value::int(2)));
//!
//!     assert_eq!(problem.count_solutions(), 3);
//!     Ok(())
//! }
//! ```
//!
//! [`Value`]: crate::solver::solution::Value
//! [`Problem`]: crate::solver::problem::Problem

pub mod error;
pub mod examples;
pub mod solver;
