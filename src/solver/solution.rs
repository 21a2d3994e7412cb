use im::{HashMap, Vector};

pub use crate::solver::value::Value;

/// A mapping from variable name to a single chosen value. Partial during
/// search, total at a solution.
pub type Assignment = HashMap<String, Value>;

/// The ordered sequence of values currently admissible for a variable.
///
/// Domains are persistent vectors, so cloning one per search frame shares
/// structure with the parent frame.
pub type Domain = Vector<Value>;

/// The current domain of every variable in the problem.
pub type Domains = HashMap<String, Domain>;

/// A domain holding exactly one value, as used for tentative assignments and
/// pre-assigned "clue" variables.
pub fn singleton(value: Value) -> Domain {
    im::vector![value]
}

/// True when every domain has been narrowed to a single value.
pub fn is_complete(domains: &Domains) -> bool {
    domains.values().all(|domain| domain.len() == 1)
}

/// The domains of the variables not yet committed by the search, for handing
/// to step callbacks.
pub fn unassigned_view(domains: &Domains, assigned: &Assignment) -> Domains {
    domains
        .iter()
        .filter(|(name, _)| !assigned.contains_key(*name))
        .map(|(name, domain)| (name.clone(), domain.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn completeness_requires_all_singletons() {
        let domains: Domains = im::hashmap! {
            "A".to_string() => singleton(Value::int(1)),
            "B".to_string() => im::vector![Value::int(1), Value::int(2)],
        };
        assert!(!is_complete(&domains));

        let narrowed = domains.update("B".to_string(), singleton(Value::int(2)));
        assert!(is_complete(&narrowed));
    }

    #[test]
    fn unassigned_view_excludes_committed_variables() {
        let domains: Domains = im::hashmap! {
            "A".to_string() => singleton(Value::int(1)),
            "B".to_string() => im::vector![Value::int(1), Value::int(2)],
        };
        let assigned: Assignment = im::hashmap! { "A".to_string() => Value::int(1) };
        let view = unassigned_view(&domains, &assigned);
        assert_eq!(view.len(), 1);
        assert!(view.contains_key("B"));
    }
}
