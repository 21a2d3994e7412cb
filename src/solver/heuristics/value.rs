use crate::solver::{
    propagation,
    search::SearchContext,
    solution::{singleton, Domains, Value},
    stats::SearchStats,
};

/// A trait for strategies that determine the order in which a variable's
/// values are tried.
pub trait ValueOrderingHeuristic {
    /// Returns the candidate values for `variable` in the order they should
    /// be tried. Values known to be dead ends may be omitted.
    fn order_values(
        &self,
        variable: &str,
        ctx: &SearchContext,
        domains: &Domains,
        stats: &mut SearchStats,
    ) -> Vec<Value>;
}

/// Tries values in their domain order. Deterministic because domains are
/// ordered sequences.
pub struct DomainOrderHeuristic;

impl ValueOrderingHeuristic for DomainOrderHeuristic {
    fn order_values(
        &self,
        variable: &str,
        _ctx: &SearchContext,
        domains: &Domains,
        _stats: &mut SearchStats,
    ) -> Vec<Value> {
        domains
            .get(variable)
            .map(|domain| domain.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Least Constraining Value: tentatively assigns each candidate, propagates,
/// and scores the result by the summed domain sizes left to the other
/// variables. Candidates are tried most-permissive first; candidates whose
/// propagation fails outright are dropped, since their branch cannot contain
/// a solution. Ties keep domain order.
pub struct LeastConstrainingValueHeuristic;

impl ValueOrderingHeuristic for LeastConstrainingValueHeuristic {
    fn order_values(
        &self,
        variable: &str,
        ctx: &SearchContext,
        domains: &Domains,
        stats: &mut SearchStats,
    ) -> Vec<Value> {
        let Some(domain) = domains.get(variable) else {
            return Vec::new();
        };
        let mut scored: Vec<(Value, usize)> = Vec::new();
        for value in domain.iter() {
            let tentative = domains.update(variable.to_string(), singleton(value.clone()));
            if let Some(reduced) = propagation::propagate(
                &tentative,
                &ctx.arcs,
                &ctx.constraints,
                &ctx.index,
                stats,
            ) {
                let score = reduced
                    .iter()
                    .filter(|(name, _)| name.as_str() != variable)
                    .map(|(_, domain)| domain.len())
                    .sum();
                scored.push((value.clone(), score));
            }
        }
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(value, _)| value).collect()
    }
}
