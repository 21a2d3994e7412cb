//! The consistency engine: AC-3 over binary arcs and generalized arc
//! consistency (GAC) over n-ary constraints.
//!
//! Both passes are monotone (domains only shrink) and return `None` as soon
//! as any domain empties.

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::solver::{
    constraint::{BinaryArc, NaryConstraint},
    solution::{Assignment, Domain, Domains, Value},
    stats::SearchStats,
    work_list::WorkList,
};

/// The variable → n-ary-constraint index that drives GAC re-enqueueing.
/// Built once per solve.
pub fn build_nary_index(constraints: &[NaryConstraint]) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (id, constraint) in constraints.iter().enumerate() {
        for var in &constraint.vars {
            let deps = index.entry(var.clone()).or_default();
            if !deps.contains(&id) {
                deps.push(id);
            }
        }
    }
    index
}

/// Runs AC-3 and then GAC, the forward-checking step performed after every
/// tentative assignment.
pub fn propagate(
    domains: &Domains,
    arcs: &[BinaryArc],
    constraints: &[NaryConstraint],
    index: &HashMap<String, Vec<usize>>,
    stats: &mut SearchStats,
) -> Option<Domains> {
    let domains = ac3(domains, arcs, stats)?;
    gac(&domains, constraints, index, stats)
}

/// Arc consistency over the directed binary arcs.
///
/// Popping arc `(head, tail, p)` keeps in the tail's domain only the values
/// supported by some head value; when the tail shrinks, every arc headed at
/// the tail is re-enqueued.
pub fn ac3(domains: &Domains, arcs: &[BinaryArc], stats: &mut SearchStats) -> Option<Domains> {
    let mut outgoing: HashMap<&str, Vec<usize>> = HashMap::new();
    for (id, arc) in arcs.iter().enumerate() {
        outgoing.entry(arc.head.as_str()).or_default().push(id);
    }

    let mut work: WorkList<usize> = WorkList::new();
    for id in 0..arcs.len() {
        work.push_back(id);
    }

    let mut domains = domains.clone();
    while let Some(id) = work.pop_front() {
        let arc = &arcs[id];
        let started = Instant::now();

        let revised: Option<Domain> = {
            let head = domains.get(&arc.head).unwrap();
            let tail = domains.get(&arc.tail).unwrap();
            let mut kept = Domain::new();
            for y in tail.iter() {
                if head.iter().any(|x| (arc.predicate)(x, y)) {
                    kept.push_back(y.clone());
                }
            }
            if kept.len() == tail.len() {
                None
            } else {
                Some(kept)
            }
        };

        let entry = stats.arc_stats.entry(id).or_default();
        entry.revisions += 1;
        entry.time_spent_micros += started.elapsed().as_micros() as u64;

        let Some(kept) = revised else {
            continue;
        };
        if kept.is_empty() {
            debug!(
                arc = %arc.descriptor.description,
                variable = %arc.tail,
                "arc revision emptied a domain"
            );
            return None;
        }
        entry.prunings += 1;
        domains = domains.update(arc.tail.clone(), kept);
        if let Some(dependents) = outgoing.get(arc.tail.as_str()) {
            for &dependent in dependents {
                work.push_back(dependent);
            }
        }
    }
    Some(domains)
}

/// Generalized arc consistency: for each n-ary constraint and each of its
/// variables, keep only values that have a full supporting assignment over
/// the current domains.
pub fn gac(
    domains: &Domains,
    constraints: &[NaryConstraint],
    index: &HashMap<String, Vec<usize>>,
    stats: &mut SearchStats,
) -> Option<Domains> {
    let mut work: WorkList<usize> = WorkList::new();
    for id in 0..constraints.len() {
        work.push_back(id);
    }

    let mut domains = domains.clone();
    while let Some(id) = work.pop_front() {
        let constraint = &constraints[id];
        let started = Instant::now();

        let mut pruned_vars: Vec<String> = Vec::new();
        let mut wiped = false;
        for var in &constraint.vars {
            let current = domains.get(var).unwrap().clone();
            let mut kept = Domain::new();
            for value in current.iter() {
                if has_support(constraint, var, value, &domains) {
                    kept.push_back(value.clone());
                }
            }
            if kept.is_empty() {
                wiped = true;
                break;
            }
            if kept.len() < current.len() {
                domains = domains.update(var.clone(), kept);
                pruned_vars.push(var.clone());
            }
        }

        let entry = stats.constraint_stats.entry(id).or_default();
        entry.revisions += 1;
        entry.time_spent_micros += started.elapsed().as_micros() as u64;
        if !pruned_vars.is_empty() || wiped {
            entry.prunings += 1;
        }

        if wiped {
            debug!(
                constraint = %constraint.descriptor.description,
                "support search emptied a domain"
            );
            return None;
        }
        for var in &pruned_vars {
            if let Some(dependents) = index.get(var) {
                for &dependent in dependents {
                    work.push_back(dependent);
                }
            }
        }
    }
    Some(domains)
}

/// The support test for `(variable, value, constraint)`: a DFS over the
/// constraint's other variables looking for a full assignment accepted by the
/// predicate. The predicate is consulted after every extension, so a definite
/// violation among the values placed so far prunes the subtree.
fn has_support(
    constraint: &NaryConstraint,
    variable: &str,
    value: &Value,
    domains: &Domains,
) -> bool {
    let local = Assignment::new().update(variable.to_string(), value.clone());
    let others: Vec<&String> = constraint
        .vars
        .iter()
        .filter(|var| var.as_str() != variable)
        .collect();
    extend_support(constraint, &others, 0, local, domains)
}

fn extend_support(
    constraint: &NaryConstraint,
    others: &[&String],
    depth: usize,
    local: Assignment,
    domains: &Domains,
) -> bool {
    if !(constraint.predicate)(&local) {
        return false;
    }
    if depth == others.len() {
        return true;
    }
    let var = others[depth];
    let Some(domain) = domains.get(var) else {
        return false;
    };
    for candidate in domain.iter() {
        let extended = local.update(var.clone(), candidate.clone());
        if extend_support(constraint, others, depth + 1, extended, domains) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::solver::{
        constraint::{ConstraintDescriptor, NaryPredicate},
        constraints::{all_different, ordering},
        solution::singleton,
    };

    use super::*;

    fn arc_pair(head: &str, tail: &str) -> Vec<BinaryArc> {
        let forward = BinaryArc {
            head: head.to_string(),
            tail: tail.to_string(),
            predicate: ordering::less_than(),
            descriptor: ConstraintDescriptor::new("LessThan", format!("{} < {}", head, tail)),
        };
        let backward = forward.reversed();
        vec![forward, backward]
    }

    fn int_domain(values: &[i64]) -> Domain {
        values.iter().map(|v| Value::int(*v)).collect()
    }

    fn sizes(domains: &Domains, name: &str) -> Vec<i64> {
        domains
            .get(name)
            .unwrap()
            .iter()
            .map(|v| match v {
                Value::Int(i) => *i,
                other => panic!("unexpected value {:?}", other),
            })
            .collect()
    }

    #[test]
    fn ac3_prunes_both_endpoints_of_a_relation() {
        let domains: Domains = im::hashmap! {
            "A".to_string() => int_domain(&[1, 2, 3]),
            "B".to_string() => int_domain(&[1, 2, 3]),
        };
        let arcs = arc_pair("A", "B");
        let mut stats = SearchStats::default();

        let reduced = ac3(&domains, &arcs, &mut stats).unwrap();
        // A < B: A loses 3, B loses 1, and order within each domain is kept.
        assert_eq!(sizes(&reduced, "A"), vec![1, 2]);
        assert_eq!(sizes(&reduced, "B"), vec![2, 3]);
    }

    #[test]
    fn ac3_reports_inconsistency_on_an_empty_domain() {
        let domains: Domains = im::hashmap! {
            "A".to_string() => int_domain(&[5]),
            "B".to_string() => int_domain(&[1, 2, 3]),
        };
        let arcs = arc_pair("A", "B");
        let mut stats = SearchStats::default();
        assert!(ac3(&domains, &arcs, &mut stats).is_none());
    }

    #[test]
    fn ac3_is_monotone() {
        let domains: Domains = im::hashmap! {
            "A".to_string() => int_domain(&[1, 2, 3, 4]),
            "B".to_string() => int_domain(&[1, 2]),
        };
        let arcs = arc_pair("A", "B");
        let mut stats = SearchStats::default();
        let reduced = ac3(&domains, &arcs, &mut stats).unwrap();
        for name in ["A", "B"] {
            assert!(reduced.get(name).unwrap().len() <= domains.get(name).unwrap().len());
        }
    }

    fn all_different_constraint(vars: &[&str]) -> NaryConstraint {
        let predicate: NaryPredicate = all_different::all_different();
        NaryConstraint {
            vars: vars.iter().map(|v| v.to_string()).collect(),
            predicate,
            descriptor: ConstraintDescriptor::new(
                "AllDifferent",
                format!("all_different({})", vars.join(", ")),
            ),
        }
    }

    #[test]
    fn gac_prunes_values_without_support() {
        // A fixed to 1 removes 1 from the other two domains.
        let domains: Domains = im::hashmap! {
            "A".to_string() => singleton(Value::int(1)),
            "B".to_string() => int_domain(&[1, 2]),
            "C".to_string() => int_domain(&[1, 2, 3]),
        };
        let constraints = vec![all_different_constraint(&["A", "B", "C"])];
        let index = build_nary_index(&constraints);
        let mut stats = SearchStats::default();

        let reduced = gac(&domains, &constraints, &index, &mut stats).unwrap();
        assert_eq!(sizes(&reduced, "B"), vec![2]);
        assert_eq!(sizes(&reduced, "C"), vec![3]);
    }

    #[test]
    fn gac_detects_the_pigeonhole_wipeout() {
        // Three variables, two values, all different: no support exists once
        // propagation squeezes the domains.
        let domains: Domains = im::hashmap! {
            "A".to_string() => int_domain(&[1, 2]),
            "B".to_string() => int_domain(&[1, 2]),
            "C".to_string() => int_domain(&[1, 2]),
        };
        let constraints = vec![all_different_constraint(&["A", "B", "C"])];
        let index = build_nary_index(&constraints);
        let mut stats = SearchStats::default();
        assert!(gac(&domains, &constraints, &index, &mut stats).is_none());
    }

    #[test]
    fn gac_leaves_supported_domains_alone() {
        let domains: Domains = im::hashmap! {
            "A".to_string() => int_domain(&[1, 2, 3]),
            "B".to_string() => int_domain(&[1, 2, 3]),
            "C".to_string() => int_domain(&[1, 2, 3]),
        };
        let constraints = vec![all_different_constraint(&["A", "B", "C"])];
        let index = build_nary_index(&constraints);
        let mut stats = SearchStats::default();
        let reduced = gac(&domains, &constraints, &index, &mut stats).unwrap();
        assert_eq!(sizes(&reduced, "A"), vec![1, 2, 3]);
    }

    #[test]
    fn index_maps_each_variable_to_its_constraints() {
        let constraints = vec![
            all_different_constraint(&["A", "B", "C"]),
            all_different_constraint(&["B", "D", "E"]),
        ];
        let index = build_nary_index(&constraints);
        assert_eq!(index.get("A"), Some(&vec![0]));
        assert_eq!(index.get("B"), Some(&vec![0, 1]));
        assert_eq!(index.get("D"), Some(&vec![1]));
    }
}
