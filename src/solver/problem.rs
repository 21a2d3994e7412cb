//! The problem model and its fluent builder API.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use prettytable::{Cell, Row, Table};
use rand::Rng;

use crate::error::{Result, SolverError};
use crate::solver::{
    constraint::{
        BinaryArc, ConstraintDescriptor, ConstraintPredicate, NaryConstraint, NaryPredicate,
    },
    constraints::{all_different, all_equal, membership, ordering, product, sum},
    expression,
    heuristics::{value::ValueOrderingHeuristic, variable::VariableSelectionHeuristic},
    min_conflicts,
    search::Solutions,
    solution::{Assignment, Domain, Domains, Value},
    stats::SearchStats,
};

/// A visualization hook invoked once per search step with snapshots of the
/// committed assignment and the remaining domains. Must not mutate either.
pub type StepCallback = Arc<dyn Fn(&Assignment, &Domains) + Send + Sync>;

/// Presentation options for a solve; purely cosmetic.
#[derive(Clone, Default)]
pub struct SolverOptions {
    /// A cumulative delay inserted after each search step.
    pub time_step: Option<Duration>,
    pub step_callback: Option<StepCallback>,
}

impl fmt::Debug for SolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverOptions")
            .field("time_step", &self.time_step)
            .field("step_callback", &self.step_callback.is_some())
            .finish()
    }
}

/// A constraint satisfaction problem: variables with finite discrete domains,
/// binary arcs and n-ary constraints.
///
/// Mutable only through the builder API before a solve; every solve clones
/// the domains, so the problem can be solved repeatedly.
#[derive(Clone, Debug, Default)]
pub struct Problem {
    order: Vec<String>,
    domains: Domains,
    arcs: Vec<BinaryArc>,
    constraints: Vec<NaryConstraint>,
    options: SolverOptions,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    // -- construction --------------------------------------------------------

    /// Adds a variable with the given domain. Rejects duplicate names and
    /// empty domains; duplicate values within a domain are tolerated.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        domain: impl IntoIterator<Item = Value>,
    ) -> Result<&mut Self> {
        let name = name.into();
        if self.domains.contains_key(&name) {
            return Err(SolverError::DuplicateVariable(name).into());
        }
        let domain: Domain = domain.into_iter().collect();
        if domain.is_empty() {
            return Err(SolverError::EmptyDomain(name).into());
        }
        self.order.push(name.clone());
        self.domains.insert(name, domain);
        Ok(self)
    }

    /// Adds several variables sharing one domain.
    pub fn add_variables(&mut self, names: &[&str], domain: &[Value]) -> Result<&mut Self> {
        for name in names {
            self.add_variable(*name, domain.iter().cloned())?;
        }
        Ok(self)
    }

    /// Adds a constraint, routing by arity: two variables require a binary
    /// predicate and install both directed arcs; one or three-plus variables
    /// require an n-ary predicate.
    pub fn add_constraint(
        &mut self,
        vars: &[&str],
        predicate: ConstraintPredicate,
    ) -> Result<&mut Self> {
        let descriptor = ConstraintDescriptor::new(
            "Predicate",
            format!("predicate({})", vars.join(", ")),
        );
        self.install(vars, predicate, descriptor)
    }

    /// Compiles a string constraint and adds it.
    pub fn add_string_constraint(&mut self, expr: &str) -> Result<&mut Self> {
        let declared: HashSet<String> = self.order.iter().cloned().collect();
        let parsed = expression::parse(expr, &declared)?;
        let vars: Vec<&str> = parsed.variables.iter().map(|name| name.as_str()).collect();
        let descriptor = ConstraintDescriptor::new("StringExpression", parsed.description);
        self.install(&vars, parsed.predicate, descriptor)
    }

    fn install(
        &mut self,
        vars: &[&str],
        predicate: ConstraintPredicate,
        descriptor: ConstraintDescriptor,
    ) -> Result<&mut Self> {
        for var in vars {
            if !self.domains.contains_key(*var) {
                return Err(SolverError::UnknownVariable((*var).to_string()).into());
            }
        }
        match (vars.len(), predicate) {
            (0, _) => {
                return Err(SolverError::ArityMismatch {
                    arity: 0,
                    expected: "at least one variable",
                }
                .into())
            }
            (2, ConstraintPredicate::Binary(predicate)) => {
                let forward = BinaryArc {
                    head: vars[0].to_string(),
                    tail: vars[1].to_string(),
                    predicate,
                    descriptor,
                };
                let backward = forward.reversed();
                self.arcs.push(forward);
                self.arcs.push(backward);
            }
            (2, ConstraintPredicate::Nary(_)) => {
                return Err(SolverError::ArityMismatch {
                    arity: 2,
                    expected: "a binary predicate",
                }
                .into())
            }
            (arity, ConstraintPredicate::Binary(_)) => {
                return Err(SolverError::ArityMismatch {
                    arity,
                    expected: "an n-ary predicate",
                }
                .into())
            }
            (_, ConstraintPredicate::Nary(predicate)) => {
                self.constraints.push(NaryConstraint {
                    vars: vars.iter().map(|v| v.to_string()).collect(),
                    predicate,
                    descriptor,
                });
            }
        }
        Ok(self)
    }

    fn install_family(
        &mut self,
        vars: &[&str],
        predicate: NaryPredicate,
        descriptor: ConstraintDescriptor,
    ) -> Result<&mut Self> {
        let owned = owned(vars);
        self.install(vars, ConstraintPredicate::binarized(&owned, predicate), descriptor)
    }

    // -- built-in constraint helpers -----------------------------------------

    pub fn add_all_different(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let descriptor = describe("AllDifferent", "all_different", vars);
        if vars.len() == 2 {
            self.install(vars, ConstraintPredicate::Binary(ordering::not_equal()), descriptor)
        } else {
            self.install(
                vars,
                ConstraintPredicate::Nary(all_different::all_different()),
                descriptor,
            )
        }
    }

    pub fn add_all_equal(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let descriptor = describe("AllEqual", "all_equal", vars);
        if vars.len() == 2 {
            self.install(vars, ConstraintPredicate::Binary(ordering::equal()), descriptor)
        } else {
            self.install(
                vars,
                ConstraintPredicate::Nary(all_equal::all_equal()),
                descriptor,
            )
        }
    }

    pub fn add_exact_sum(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        let descriptor =
            ConstraintDescriptor::new("ExactSum", format!("sum({}) == {}", vars.join(" + "), target));
        self.install_family(vars, sum::exact_sum(sum::unit_terms(&owned(vars)), target), descriptor)
    }

    /// `Σ mᵢ·vᵢ == target`, one multiplier per variable.
    pub fn add_exact_sum_weighted(
        &mut self,
        vars: &[&str],
        multipliers: &[f64],
        target: f64,
    ) -> Result<&mut Self> {
        let terms = weighted(vars, multipliers)?;
        let descriptor = ConstraintDescriptor::new(
            "ExactSum",
            format!("weighted_sum({}) == {}", vars.join(", "), target),
        );
        self.install_family(vars, sum::exact_sum(terms, target), descriptor)
    }

    pub fn add_min_sum(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        let descriptor =
            ConstraintDescriptor::new("MinSum", format!("sum({}) >= {}", vars.join(" + "), target));
        self.install_family(vars, sum::min_sum(sum::unit_terms(&owned(vars)), target), descriptor)
    }

    pub fn add_max_sum(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        let descriptor =
            ConstraintDescriptor::new("MaxSum", format!("sum({}) <= {}", vars.join(" + "), target));
        self.install_family(vars, sum::max_sum(sum::unit_terms(&owned(vars)), target), descriptor)
    }

    /// `low <= Σ vᵢ <= high`, both bounds inclusive.
    pub fn add_sum_in_range(&mut self, vars: &[&str], low: f64, high: f64) -> Result<&mut Self> {
        let descriptor = ConstraintDescriptor::new(
            "SumInRange",
            format!("{} <= sum({}) <= {}", low, vars.join(" + "), high),
        );
        self.install_family(
            vars,
            sum::sum_in_range(sum::unit_terms(&owned(vars)), low, high, false, false),
            descriptor,
        )
    }

    pub fn add_exact_product(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        let descriptor = ConstraintDescriptor::new(
            "ExactProduct",
            format!("product({}) == {}", vars.join(" * "), target),
        );
        self.install_family(vars, product::exact_product(owned(vars), target), descriptor)
    }

    pub fn add_min_product(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        let descriptor = ConstraintDescriptor::new(
            "MinProduct",
            format!("product({}) >= {}", vars.join(" * "), target),
        );
        self.install_family(vars, product::min_product(owned(vars), target), descriptor)
    }

    pub fn add_max_product(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        let descriptor = ConstraintDescriptor::new(
            "MaxProduct",
            format!("product({}) <= {}", vars.join(" * "), target),
        );
        self.install_family(vars, product::max_product(owned(vars), target), descriptor)
    }

    pub fn add_in_set(&mut self, vars: &[&str], values: &[Value]) -> Result<&mut Self> {
        let descriptor = describe("InSet", "in_set", vars);
        self.install_family(vars, membership::in_set(values.iter().cloned().collect()), descriptor)
    }

    pub fn add_not_in_set(&mut self, vars: &[&str], values: &[Value]) -> Result<&mut Self> {
        let descriptor = describe("NotInSet", "not_in_set", vars);
        self.install_family(
            vars,
            membership::not_in_set(values.iter().cloned().collect()),
            descriptor,
        )
    }

    /// At least `k` of `vars` take a value in `values`.
    pub fn add_some_in_set(
        &mut self,
        vars: &[&str],
        values: &[Value],
        k: usize,
    ) -> Result<&mut Self> {
        let descriptor = describe("SomeInSet", "some_in_set", vars);
        self.install_family(
            vars,
            membership::some_in_set(vars.len(), values.iter().cloned().collect(), k),
            descriptor,
        )
    }

    /// At least `k` of `vars` take a value outside `values`.
    pub fn add_some_not_in_set(
        &mut self,
        vars: &[&str],
        values: &[Value],
        k: usize,
    ) -> Result<&mut Self> {
        let descriptor = describe("SomeNotInSet", "some_not_in_set", vars);
        self.install_family(
            vars,
            membership::some_not_in_set(vars.len(), values.iter().cloned().collect(), k),
            descriptor,
        )
    }

    pub fn add_ascending(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let descriptor = describe("Ascending", "ascending", vars);
        self.install_family(vars, ordering::ascending(owned(vars)), descriptor)
    }

    pub fn add_strictly_ascending(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let descriptor = describe("StrictlyAscending", "strictly_ascending", vars);
        self.install_family(vars, ordering::strictly_ascending(owned(vars)), descriptor)
    }

    pub fn add_descending(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let descriptor = describe("Descending", "descending", vars);
        self.install_family(vars, ordering::descending(owned(vars)), descriptor)
    }

    // -- options and lifecycle -----------------------------------------------

    pub fn set_options(&mut self, options: SolverOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// A deep copy; solves on the copy leave this problem untouched.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Wipes the entire problem.
    pub fn clear(&mut self) {
        *self = Problem::default();
    }

    // -- accessors ------------------------------------------------------------

    pub fn variable_order(&self) -> &[String] {
        &self.order
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub fn arcs(&self) -> &[BinaryArc] {
        &self.arcs
    }

    pub fn nary_constraints(&self) -> &[NaryConstraint] {
        &self.constraints
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// The number of constraints referencing `name` (directed arcs counted
    /// individually).
    pub fn degree(&self, name: &str) -> usize {
        let arc_count = self
            .arcs
            .iter()
            .filter(|arc| arc.head == name || arc.tail == name)
            .count();
        let nary_count = self
            .constraints
            .iter()
            .filter(|constraint| constraint.vars.iter().any(|var| var == name))
            .count();
        arc_count + nary_count
    }

    /// Non-fatal diagnostics: isolated variables, duplicate domain values,
    /// suspicious constraint-to-variable ratios.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for name in &self.order {
            if self.degree(name) == 0 {
                warnings.push(format!(
                    "variable `{}` is not referenced by any constraint",
                    name
                ));
            }
            let domain = self.domains.get(name).unwrap();
            let distinct: HashSet<&Value> = domain.iter().collect();
            if distinct.len() < domain.len() {
                warnings.push(format!("domain of `{}` contains duplicate values", name));
            }
        }
        let constraint_count = self.arcs.len() / 2 + self.constraints.len();
        if !self.order.is_empty() && constraint_count > 3 * self.order.len() {
            warnings.push(format!(
                "{} constraints over {} variables; the problem may be over-constrained",
                constraint_count,
                self.order.len()
            ));
        }
        warnings
    }

    /// A tabular rendering of the variables and constraints.
    pub fn summary(&self) -> String {
        let mut variables = Table::new();
        variables.add_row(Row::new(vec![
            Cell::new("Variable"),
            Cell::new("Domain Size"),
            Cell::new("Values"),
        ]));
        for name in &self.order {
            let domain = self.domains.get(name).unwrap();
            let mut preview: String = domain
                .iter()
                .take(6)
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if domain.len() > 6 {
                preview.push_str(", …");
            }
            variables.add_row(Row::new(vec![
                Cell::new(name),
                Cell::new(&domain.len().to_string()),
                Cell::new(&preview),
            ]));
        }

        let mut constraints = Table::new();
        constraints.add_row(Row::new(vec![
            Cell::new("Constraint Type"),
            Cell::new("Description"),
        ]));
        for arc in self.arcs.iter().step_by(2) {
            // Each user constraint produced two arcs; list it once.
            constraints.add_row(Row::new(vec![
                Cell::new(&arc.descriptor.name),
                Cell::new(&arc.descriptor.description),
            ]));
        }
        for constraint in &self.constraints {
            constraints.add_row(Row::new(vec![
                Cell::new(&constraint.descriptor.name),
                Cell::new(&constraint.descriptor.description),
            ]));
        }

        format!("{}\n{}", variables, constraints)
    }

    pub fn print_summary(&self) {
        println!("{}", self.summary());
    }

    // -- solving --------------------------------------------------------------

    /// The first solution of the deterministic enumeration, or `None` when
    /// the problem is unsolvable.
    pub fn solve(&self) -> Option<Assignment> {
        self.solutions().next()
    }

    pub fn solve_with_stats(&self) -> (Option<Assignment>, SearchStats) {
        let mut solutions = self.solutions();
        let first = solutions.next();
        (first, solutions.into_stats())
    }

    /// The lazy stream of all solutions, in deterministic order. Single
    /// consumption; call again for a fresh enumeration.
    pub fn solutions(&self) -> Solutions {
        Solutions::new(self)
    }

    /// An enumeration driven by the given heuristics instead of the default
    /// MRV+degree / least-constraining-value pair.
    pub fn solutions_with(
        &self,
        selector: Box<dyn VariableSelectionHeuristic>,
        orderer: Box<dyn ValueOrderingHeuristic>,
    ) -> Solutions {
        Solutions::with_heuristics(self, selector, orderer)
    }

    pub fn get_all_solutions(&self) -> Vec<Assignment> {
        self.solutions().collect()
    }

    /// Counts solutions in O(1) memory over the stream.
    pub fn count_solutions(&self) -> usize {
        self.solutions().count()
    }

    /// Short-circuits after the second solution.
    pub fn has_multiple_solutions(&self) -> bool {
        self.solutions().take(2).count() == 2
    }

    pub fn first_n(&self, n: usize) -> Vec<Assignment> {
        self.solutions().take(n).collect()
    }

    /// Min-conflicts local search with a thread-local RNG. Incomplete: `None`
    /// means the step budget ran out, not that the problem is unsolvable.
    pub fn solve_with_min_conflicts(&self, max_steps: usize) -> Option<Assignment> {
        self.min_conflicts_with_rng(max_steps, &mut rand::thread_rng())
    }

    /// Min-conflicts with an injected (typically seeded) RNG.
    pub fn min_conflicts_with_rng(
        &self,
        max_steps: usize,
        rng: &mut impl Rng,
    ) -> Option<Assignment> {
        min_conflicts::min_conflicts(self, max_steps, rng)
    }
}

fn owned(vars: &[&str]) -> Vec<String> {
    vars.iter().map(|v| v.to_string()).collect()
}

fn describe(name: &str, helper: &str, vars: &[&str]) -> ConstraintDescriptor {
    ConstraintDescriptor::new(name, format!("{}({})", helper, vars.join(", ")))
}

fn weighted(vars: &[&str], multipliers: &[f64]) -> Result<Vec<(String, f64)>> {
    if vars.len() != multipliers.len() {
        return Err(SolverError::ArityMismatch {
            arity: vars.len(),
            expected: "one multiplier per variable",
        }
        .into());
    }
    Ok(vars
        .iter()
        .zip(multipliers)
        .map(|(var, multiplier)| (var.to_string(), *multiplier))
        .collect())
}
