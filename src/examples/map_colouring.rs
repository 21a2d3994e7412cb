//! Colouring the Australian map with three colours: no two adjacent regions
//! may share one, and Tasmania is unconstrained.

use crate::error::Result;
use crate::solver::{problem::Problem, solution::Value};

pub const REGIONS: [&str; 7] = ["WA", "NT", "SA", "Q", "NSW", "V", "T"];

pub const ADJACENCIES: [(&str, &str); 9] = [
    ("WA", "NT"),
    ("WA", "SA"),
    ("NT", "SA"),
    ("NT", "Q"),
    ("SA", "Q"),
    ("SA", "NSW"),
    ("SA", "V"),
    ("Q", "NSW"),
    ("NSW", "V"),
];

pub fn build_australia_problem() -> Result<Problem> {
    let mut problem = Problem::new();
    problem.add_variables(&REGIONS, &Value::symbols(&["red", "green", "blue"]))?;
    for (a, b) in ADJACENCIES {
        problem.add_string_constraint(&format!("{} != {}", a, b))?;
    }
    Ok(problem)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use crate::solver::solution::Assignment;

    use super::*;

    fn colour<'a>(solution: &'a Assignment, region: &str) -> &'a Value {
        solution.get(region).unwrap()
    }

    #[test]
    fn adjacent_regions_always_differ() {
        let _ = tracing_subscriber::fmt::try_init();

        let problem = build_australia_problem().unwrap();
        let solutions = problem.get_all_solutions();
        assert!(!solutions.is_empty());
        for solution in &solutions {
            for (a, b) in ADJACENCIES {
                assert_ne!(colour(solution, a), colour(solution, b));
            }
        }
    }

    #[test]
    fn solution_count_is_positive_and_even() {
        let problem = build_australia_problem().unwrap();
        let count = problem.count_solutions();
        assert!(count > 0);
        assert_eq!(count % 2, 0);
    }

    #[test]
    fn tasmania_takes_every_colour() {
        let problem = build_australia_problem().unwrap();
        let seen: HashSet<Value> = problem
            .solutions()
            .map(|solution| solution.get("T").unwrap().clone())
            .collect();
        assert_eq!(seen.len(), 3);
    }

    mod prop_tests {
        use proptest::prelude::*;

        use super::*;

        fn generate_map_colouring_problem() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)>
        {
            (2..12usize).prop_flat_map(|num_regions| {
                let edges = proptest::collection::vec(
                    (0..num_regions, 0..num_regions)
                        .prop_filter("edges join distinct regions", |(a, b)| a != b)
                        .prop_map(|(a, b)| if a < b { (a, b) } else { (b, a) }),
                    0..=(num_regions * (num_regions - 1) / 2).min(20),
                )
                .prop_map(|edges| {
                    let unique: std::collections::HashSet<(usize, usize)> =
                        edges.into_iter().collect();
                    unique.into_iter().collect::<Vec<_>>()
                });
                (Just(num_regions), edges)
            })
        }

        proptest! {
            #[test]
            fn random_maps_colour_correctly((num_regions, adjacencies) in generate_map_colouring_problem()) {
                let names: Vec<String> = (0..num_regions).map(|i| format!("R{}", i)).collect();
                let name_refs: Vec<&str> = names.iter().map(|n| n.as_str()).collect();

                let mut problem = Problem::new();
                problem
                    .add_variables(&name_refs, &Value::symbols(&["red", "green", "blue", "yellow"]))
                    .unwrap();
                for (a, b) in &adjacencies {
                    problem
                        .add_string_constraint(&format!("R{} != R{}", a, b))
                        .unwrap();
                }

                if let Some(solution) = problem.solve() {
                    for (a, b) in &adjacencies {
                        let left = solution.get(&format!("R{}", a)).unwrap();
                        let right = solution.get(&format!("R{}", b)).unwrap();
                        prop_assert_ne!(left, right, "regions {} and {} share a colour", a, b);
                    }
                }
            }
        }
    }
}
