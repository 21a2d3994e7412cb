use std::fmt;
use std::sync::Arc;

use crate::solver::solution::{Assignment, Value};

/// A predicate over the two endpoints of a binary arc.
///
/// Called as `predicate(head_value, tail_value)`.
pub type BinaryPredicate = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// A predicate over an assignment of an n-ary constraint's variables.
///
/// The assignment is always restricted to the constraint's own variables, and
/// may be partial: the predicate must be optimistic about missing variables,
/// returning `false` only when the values present already constitute a
/// definite violation.
pub type NaryPredicate = Arc<dyn Fn(&Assignment) -> bool + Send + Sync>;

/// A constraint predicate classified by arity.
#[derive(Clone)]
pub enum ConstraintPredicate {
    Binary(BinaryPredicate),
    Nary(NaryPredicate),
}

impl ConstraintPredicate {
    pub fn binary(f: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static) -> Self {
        ConstraintPredicate::Binary(Arc::new(f))
    }

    pub fn nary(f: impl Fn(&Assignment) -> bool + Send + Sync + 'static) -> Self {
        ConstraintPredicate::Nary(Arc::new(f))
    }

    /// Wraps an n-ary predicate as a binary one when the constraint spans
    /// exactly two variables, so the builder can install arcs for AC-3 to act
    /// on directly. Any other arity keeps the n-ary form.
    pub fn binarized(vars: &[String], predicate: NaryPredicate) -> Self {
        if vars.len() == 2 {
            let head = vars[0].clone();
            let tail = vars[1].clone();
            ConstraintPredicate::Binary(Arc::new(move |x, y| {
                let mut local = Assignment::new();
                local.insert(head.clone(), x.clone());
                local.insert(tail.clone(), y.clone());
                predicate(&local)
            }))
        } else {
            ConstraintPredicate::Nary(predicate)
        }
    }
}

impl fmt::Debug for ConstraintPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintPredicate::Binary(_) => write!(f, "ConstraintPredicate::Binary(..)"),
            ConstraintPredicate::Nary(_) => write!(f, "ConstraintPredicate::Nary(..)"),
        }
    }
}

/// Human-readable labelling for a constraint, used by the problem summary and
/// the search statistics table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub description: String,
}

impl ConstraintDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A directed binary arc `(head, tail, predicate)`.
///
/// AC-3 revises the tail: a tail value survives iff some head value supports
/// it. Each user-supplied two-variable constraint installs both directions.
#[derive(Clone)]
pub struct BinaryArc {
    pub head: String,
    pub tail: String,
    pub predicate: BinaryPredicate,
    pub descriptor: ConstraintDescriptor,
}

impl BinaryArc {
    /// The same constraint viewed from the other endpoint.
    pub fn reversed(&self) -> BinaryArc {
        let forward = Arc::clone(&self.predicate);
        BinaryArc {
            head: self.tail.clone(),
            tail: self.head.clone(),
            predicate: Arc::new(move |x, y| forward(y, x)),
            descriptor: self.descriptor.clone(),
        }
    }
}

impl fmt::Debug for BinaryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryArc")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// An n-ary constraint `(vars, predicate)` with `vars` ordered.
#[derive(Clone)]
pub struct NaryConstraint {
    pub vars: Vec<String>,
    pub predicate: NaryPredicate,
    pub descriptor: ConstraintDescriptor,
}

impl NaryConstraint {
    /// The assignment restricted to this constraint's variables.
    pub fn restrict(&self, assignment: &Assignment) -> Assignment {
        let mut local = Assignment::new();
        for var in &self.vars {
            if let Some(value) = assignment.get(var) {
                local.insert(var.clone(), value.clone());
            }
        }
        local
    }

    /// Evaluates the predicate on the restriction of `assignment`.
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        (self.predicate)(&self.restrict(assignment))
    }
}

impl fmt::Debug for NaryConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaryConstraint")
            .field("vars", &self.vars)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
