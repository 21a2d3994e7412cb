use crate::solver::{
    search::SearchContext,
    solution::{Assignment, Domains},
};

/// A trait for strategies that select the next variable to branch on during
/// search.
pub trait VariableSelectionHeuristic {
    /// Selects one of the variables not yet committed by the search.
    ///
    /// # Returns
    ///
    /// * `Some(name)` of an unassigned variable, if any exist.
    /// * `None` once every variable is assigned.
    fn select_variable(
        &self,
        ctx: &SearchContext,
        assigned: &Assignment,
        domains: &Domains,
    ) -> Option<String>;
}

/// A simple heuristic that selects the first unassigned variable in
/// insertion order.
pub struct SelectFirstHeuristic;

impl VariableSelectionHeuristic for SelectFirstHeuristic {
    fn select_variable(
        &self,
        ctx: &SearchContext,
        assigned: &Assignment,
        _domains: &Domains,
    ) -> Option<String> {
        ctx.order
            .iter()
            .find(|name| !assigned.contains_key(*name))
            .cloned()
    }
}

/// Minimum Remaining Values: selects the unassigned variable with the
/// smallest current domain, a "fail-first" strategy. Ties go to insertion
/// order; a singleton domain is taken immediately.
pub struct MinRemainingValuesHeuristic;

impl VariableSelectionHeuristic for MinRemainingValuesHeuristic {
    fn select_variable(
        &self,
        ctx: &SearchContext,
        assigned: &Assignment,
        domains: &Domains,
    ) -> Option<String> {
        let mut best: Option<(&String, usize)> = None;
        for name in &ctx.order {
            if assigned.contains_key(name) {
                continue;
            }
            let size = domains.get(name).map(|d| d.len()).unwrap_or(0);
            if size == 1 {
                return Some(name.clone());
            }
            match &best {
                Some((_, smallest)) if *smallest <= size => {}
                _ => best = Some((name, size)),
            }
        }
        best.map(|(name, _)| name.clone())
    }
}

/// MRV with ties broken by highest degree: the total number of binary arcs
/// and n-ary constraints the variable appears in. This is the solver's
/// default.
pub struct DegreeTieBreakHeuristic;

impl VariableSelectionHeuristic for DegreeTieBreakHeuristic {
    fn select_variable(
        &self,
        ctx: &SearchContext,
        assigned: &Assignment,
        domains: &Domains,
    ) -> Option<String> {
        let mut best: Option<(&String, usize, usize)> = None;
        for name in &ctx.order {
            if assigned.contains_key(name) {
                continue;
            }
            let size = domains.get(name).map(|d| d.len()).unwrap_or(0);
            if size == 1 {
                return Some(name.clone());
            }
            let degree = ctx.degrees.get(name).copied().unwrap_or(0);
            let better = match &best {
                None => true,
                Some((_, smallest, highest)) => {
                    size < *smallest || (size == *smallest && degree > *highest)
                }
            };
            if better {
                best = Some((name, size, degree));
            }
        }
        best.map(|(name, _, _)| name.clone())
    }
}
