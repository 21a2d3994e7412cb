//! Worked problem definitions, doubling as the integration suite for the
//! solver.

pub mod change_making;
pub mod magic_square;
pub mod map_colouring;
pub mod n_queens;
