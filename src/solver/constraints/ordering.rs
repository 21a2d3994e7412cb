//! Ordering constraints along an explicit variable order, plus the binary
//! comparison specializations used for two-variable constraints.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::solver::{
    constraint::{BinaryPredicate, NaryPredicate},
    solution::Assignment,
};

fn comparison_chain(
    order: Vec<String>,
    ok: impl Fn(Ordering) -> bool + Send + Sync + 'static,
) -> NaryPredicate {
    Arc::new(move |assignment: &Assignment| {
        // Any participant still unbound: recheck once the chain is complete.
        if order.iter().any(|var| !assignment.contains_key(var)) {
            return true;
        }
        order.windows(2).all(|pair| {
            let left = &assignment[&pair[0]];
            let right = &assignment[&pair[1]];
            match left.numeric_cmp(right) {
                Some(ordering) => ok(ordering),
                None => false,
            }
        })
    })
}

/// Non-decreasing along `order`.
pub fn ascending(order: Vec<String>) -> NaryPredicate {
    comparison_chain(order, |o| o != Ordering::Greater)
}

/// Strictly increasing along `order`.
pub fn strictly_ascending(order: Vec<String>) -> NaryPredicate {
    comparison_chain(order, |o| o == Ordering::Less)
}

/// Non-increasing along `order`.
pub fn descending(order: Vec<String>) -> NaryPredicate {
    comparison_chain(order, |o| o != Ordering::Less)
}

/// Structural equality of the two endpoints.
pub fn equal() -> BinaryPredicate {
    Arc::new(|a, b| a == b)
}

/// Structural inequality of the two endpoints.
pub fn not_equal() -> BinaryPredicate {
    Arc::new(|a, b| a != b)
}

pub fn less_than() -> BinaryPredicate {
    Arc::new(|a, b| a.numeric_cmp(b) == Some(Ordering::Less))
}

pub fn less_equal() -> BinaryPredicate {
    Arc::new(|a, b| matches!(a.numeric_cmp(b), Some(Ordering::Less | Ordering::Equal)))
}

pub fn greater_than() -> BinaryPredicate {
    Arc::new(|a, b| a.numeric_cmp(b) == Some(Ordering::Greater))
}

pub fn greater_equal() -> BinaryPredicate {
    Arc::new(|a, b| matches!(a.numeric_cmp(b), Some(Ordering::Greater | Ordering::Equal)))
}
