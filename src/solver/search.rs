//! The systematic search engine: depth-first backtracking with
//! forward-checking, driven by pluggable variable- and value-ordering
//! heuristics.

use std::collections::HashMap;

use tracing::debug;

use crate::solver::{
    constraint::{BinaryArc, NaryConstraint},
    heuristics::{
        value::{LeastConstrainingValueHeuristic, ValueOrderingHeuristic},
        variable::{DegreeTieBreakHeuristic, VariableSelectionHeuristic},
    },
    problem::{Problem, SolverOptions},
    propagation,
    solution::{singleton, unassigned_view, Assignment, Domains, Value},
    stats::SearchStats,
};

/// Everything the search needs from the problem, assembled once per solve.
pub struct SearchContext {
    /// Variable names in insertion order; drives deterministic tie-breaking.
    pub order: Vec<String>,
    pub arcs: Vec<BinaryArc>,
    pub constraints: Vec<NaryConstraint>,
    /// Variable → n-ary constraints mentioning it.
    pub index: HashMap<String, Vec<usize>>,
    /// Variable → total constraint count, for the degree tie-break.
    pub degrees: HashMap<String, usize>,
    pub options: SolverOptions,
}

impl SearchContext {
    pub(crate) fn new(problem: &Problem) -> Self {
        let constraints = problem.nary_constraints().to_vec();
        let index = propagation::build_nary_index(&constraints);
        let mut degrees: HashMap<String, usize> = HashMap::new();
        for name in problem.variable_order() {
            let arc_count = problem
                .arcs()
                .iter()
                .filter(|arc| arc.head == *name || arc.tail == *name)
                .count();
            let nary_count = index.get(name).map(|deps| deps.len()).unwrap_or(0);
            degrees.insert(name.clone(), arc_count + nary_count);
        }
        SearchContext {
            order: problem.variable_order().to_vec(),
            arcs: problem.arcs().to_vec(),
            constraints,
            index,
            degrees,
            options: problem.options().clone(),
        }
    }
}

struct Frame {
    assigned: Assignment,
    domains: Domains,
    variable: String,
    candidates: std::vec::IntoIter<Value>,
}

enum SearchState {
    Fresh(Domains),
    Running,
    Exhausted,
}

/// The lazy all-solutions stream.
///
/// A pull-based iterator over an explicit stack of search frames, each
/// capturing a branch variable, its remaining candidate values and the
/// domains in force before the branch. Consuming the iterator drives the
/// depth-first search; dropping it abandons the search.
pub struct Solutions {
    ctx: SearchContext,
    selector: Box<dyn VariableSelectionHeuristic>,
    orderer: Box<dyn ValueOrderingHeuristic>,
    stack: Vec<Frame>,
    stats: SearchStats,
    state: SearchState,
}

impl Solutions {
    pub(crate) fn new(problem: &Problem) -> Self {
        Self::with_heuristics(
            problem,
            Box::new(DegreeTieBreakHeuristic),
            Box::new(LeastConstrainingValueHeuristic),
        )
    }

    pub(crate) fn with_heuristics(
        problem: &Problem,
        selector: Box<dyn VariableSelectionHeuristic>,
        orderer: Box<dyn ValueOrderingHeuristic>,
    ) -> Self {
        Solutions {
            ctx: SearchContext::new(problem),
            selector,
            orderer,
            stack: Vec::new(),
            stats: SearchStats::default(),
            state: SearchState::Fresh(problem.domains().clone()),
        }
    }

    /// Statistics accumulated so far by this search.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn into_stats(self) -> SearchStats {
        self.stats
    }

    fn propagate(&mut self, domains: &Domains) -> Option<Domains> {
        propagation::propagate(
            domains,
            &self.ctx.arcs,
            &self.ctx.constraints,
            &self.ctx.index,
            &mut self.stats,
        )
    }

    /// Builds the frame for the next branch variable under `assigned`.
    fn expand(&mut self, assigned: Assignment, domains: Domains) -> Frame {
        let Some(variable) = self
            .selector
            .select_variable(&self.ctx, &assigned, &domains)
        else {
            // Unreachable while assigned is incomplete; an empty candidate
            // list makes the frame a dead end rather than a panic.
            return Frame {
                assigned,
                domains,
                variable: String::new(),
                candidates: Vec::new().into_iter(),
            };
        };
        let candidates = self
            .orderer
            .order_values(&variable, &self.ctx, &domains, &mut self.stats);
        Frame {
            assigned,
            domains,
            variable,
            candidates: candidates.into_iter(),
        }
    }

    fn notify_step(&self, assigned: &Assignment, domains: &Domains) {
        if let Some(callback) = &self.ctx.options.step_callback {
            callback(assigned, &unassigned_view(domains, assigned));
        }
        if let Some(pause) = self.ctx.options.time_step {
            std::thread::sleep(pause);
        }
    }
}

impl Iterator for Solutions {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        match std::mem::replace(&mut self.state, SearchState::Running) {
            SearchState::Exhausted => {
                self.state = SearchState::Exhausted;
                return None;
            }
            SearchState::Fresh(initial) => {
                let Some(propagated) = self.propagate(&initial) else {
                    self.state = SearchState::Exhausted;
                    return None;
                };
                if self.ctx.order.is_empty() {
                    self.state = SearchState::Exhausted;
                    return Some(Assignment::new());
                }
                let root = self.expand(Assignment::new(), propagated);
                self.stack.push(root);
            }
            SearchState::Running => {}
        }

        loop {
            if self.stack.is_empty() {
                debug!(
                    nodes = self.stats.nodes_visited,
                    backtracks = self.stats.backtracks,
                    "search space exhausted"
                );
                self.state = SearchState::Exhausted;
                return None;
            }
            let top = self.stack.len() - 1;
            let Some(value) = self.stack[top].candidates.next() else {
                self.stack.pop();
                self.stats.backtracks += 1;
                continue;
            };

            self.stats.nodes_visited += 1;
            let variable = self.stack[top].variable.clone();
            let assigned = self.stack[top].assigned.update(variable.clone(), value.clone());
            let tentative = self.stack[top].domains.update(variable, singleton(value));

            let Some(propagated) = self.propagate(&tentative) else {
                self.stats.backtracks += 1;
                continue;
            };
            self.notify_step(&assigned, &propagated);

            if assigned.len() == self.ctx.order.len() {
                return Some(assigned);
            }
            let frame = self.expand(assigned, propagated);
            self.stack.push(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::solver::{problem::Problem, solution::Value};

    use super::*;

    fn ordered_pair_problem() -> Problem {
        let mut problem = Problem::new();
        problem
            .add_variables(&["A", "B"], &Value::int_range(1..=3))
            .unwrap()
            .add_string_constraint("A < B")
            .unwrap();
        problem
    }

    #[test]
    fn enumeration_order_is_deterministic() {
        let problem = ordered_pair_problem();
        let pairs: Vec<(i64, i64)> = problem
            .solutions()
            .map(|solution| {
                let a = match solution.get("A") {
                    Some(Value::Int(i)) => *i,
                    other => panic!("unexpected value {:?}", other),
                };
                let b = match solution.get("B") {
                    Some(Value::Int(i)) => *i,
                    other => panic!("unexpected value {:?}", other),
                };
                (a, b)
            })
            .collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);

        // A second run yields the same sequence.
        let rerun: Vec<usize> = problem.solutions().map(|_| 1).collect();
        assert_eq!(rerun.len(), pairs.len());
    }

    #[test]
    fn solve_is_the_first_streamed_solution() {
        let problem = ordered_pair_problem();
        let first = problem.solve().unwrap();
        let streamed = problem.solutions().next().unwrap();
        assert_eq!(first, streamed);
    }

    #[test]
    fn counting_matches_materialized_enumeration() {
        let problem = ordered_pair_problem();
        let all = problem.get_all_solutions();
        assert_eq!(problem.count_solutions(), all.len());
        assert_eq!(problem.count_solutions(), 3);
        assert!(problem.has_multiple_solutions());
    }

    #[test]
    fn first_n_truncates_or_exhausts() {
        let problem = ordered_pair_problem();
        assert_eq!(problem.first_n(2).len(), 2);
        assert_eq!(problem.first_n(10), problem.get_all_solutions());
    }

    #[test]
    fn every_solution_satisfies_every_constraint() {
        let problem = ordered_pair_problem();
        for solution in problem.solutions() {
            for constraint in problem.nary_constraints() {
                assert!(constraint.is_satisfied_by(&solution));
            }
            for arc in problem.arcs() {
                let head = solution.get(&arc.head).unwrap();
                let tail = solution.get(&arc.tail).unwrap();
                assert!((arc.predicate)(head, tail));
            }
        }
    }

    #[test]
    fn solutions_draw_from_declared_domains() {
        let problem = ordered_pair_problem();
        let declared = problem.domains().clone();
        for solution in problem.solutions() {
            for (name, value) in solution.iter() {
                assert!(declared.get(name).unwrap().contains(value));
            }
        }
    }

    #[test]
    fn unsolvable_pigeonhole_reports_no_solutions() {
        let mut problem = Problem::new();
        problem
            .add_variables(&["A", "B", "C"], &Value::int_range(1..=2))
            .unwrap()
            .add_all_different(&["A", "B", "C"])
            .unwrap();
        assert!(problem.solve().is_none());
        assert_eq!(problem.count_solutions(), 0);
        assert!(!problem.has_multiple_solutions());
    }

    #[test]
    fn single_variable_unary_constraint() {
        let mut problem = Problem::new();
        problem
            .add_variable("A", Value::int_range(1..=5))
            .unwrap()
            .add_string_constraint("A == 3")
            .unwrap();
        let solutions = problem.get_all_solutions();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].get("A"), Some(&Value::int(3)));

        let mut unsat = Problem::new();
        unsat
            .add_variable("A", Value::int_range(1..=5))
            .unwrap()
            .add_string_constraint("A == 9")
            .unwrap();
        assert!(unsat.solve().is_none());
    }

    #[test]
    fn clue_variables_are_honored() {
        let mut problem = Problem::new();
        problem
            .add_variable("A", vec![Value::int(2)])
            .unwrap()
            .add_variable("B", Value::int_range(1..=3))
            .unwrap()
            .add_string_constraint("A < B")
            .unwrap();
        let solutions = problem.get_all_solutions();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].get("B"), Some(&Value::int(3)));
    }

    #[test]
    fn step_callback_sees_disjoint_snapshots() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let steps = Arc::new(AtomicUsize::new(0));
        let observed = steps.clone();
        let mut problem = ordered_pair_problem();
        problem.set_options(crate::solver::problem::SolverOptions {
            time_step: None,
            step_callback: Some(Arc::new(move |assigned, unassigned| {
                observed.fetch_add(1, Ordering::SeqCst);
                for name in assigned.keys() {
                    assert!(!unassigned.contains_key(name));
                }
            })),
        });
        let _ = problem.solve();
        assert!(steps.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn degree_tie_break_never_explores_more_than_plain_mrv() {
        use crate::solver::heuristics::{
            value::LeastConstrainingValueHeuristic,
            variable::{DegreeTieBreakHeuristic, MinRemainingValuesHeuristic},
        };

        let mut problem = Problem::new();
        let domain = Value::int_range(0..=2);
        for i in 0..8 {
            problem.add_variable(format!("L{}", i), domain.clone()).unwrap();
        }
        problem.add_variable("centre", domain).unwrap();
        for i in 0..8 {
            problem
                .add_string_constraint(&format!("centre != L{}", i))
                .unwrap();
        }

        let mut with_degree = problem.solutions_with(
            Box::new(DegreeTieBreakHeuristic),
            Box::new(LeastConstrainingValueHeuristic),
        );
        let count_degree = with_degree.by_ref().count();
        let nodes_degree = with_degree.stats().nodes_visited;

        let mut plain = problem.solutions_with(
            Box::new(MinRemainingValuesHeuristic),
            Box::new(LeastConstrainingValueHeuristic),
        );
        let count_plain = plain.by_ref().count();
        let nodes_plain = plain.stats().nodes_visited;

        assert_eq!(count_degree, count_plain);
        assert!(nodes_degree <= nodes_plain);
    }
}
