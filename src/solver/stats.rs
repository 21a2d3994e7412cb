use std::collections::HashMap;

use prettytable::{Cell, Row, Table};

use crate::solver::constraint::{BinaryArc, NaryConstraint};

/// Holds performance statistics for a single constraint.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerConstraintStats {
    /// The number of times the constraint was revised during propagation.
    pub revisions: u64,
    /// The number of revisions that pruned at least one domain.
    pub prunings: u64,
    /// The total time spent revising this constraint, in microseconds.
    pub time_spent_micros: u64,
}

/// Statistics for a single solve, threaded through the search explicitly.
#[derive(Debug, Default)]
pub struct SearchStats {
    /// The total number of tentative assignments committed.
    pub nodes_visited: u64,
    /// The total number of times the search backtracked.
    pub backtracks: u64,
    /// Per-arc statistics, keyed by the arc's index.
    pub arc_stats: HashMap<usize, PerConstraintStats>,
    /// Per-n-ary-constraint statistics, keyed by the constraint's index.
    pub constraint_stats: HashMap<usize, PerConstraintStats>,
}

/// Renders the per-constraint statistics as a table, slowest constraints
/// last.
pub fn render_stats_table(
    stats: &SearchStats,
    arcs: &[BinaryArc],
    constraints: &[NaryConstraint],
) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Constraint Type"),
        Cell::new("Description"),
        Cell::new("Revisions"),
        Cell::new("Prunings"),
        Cell::new("Time / Call (µs)"),
        Cell::new("Total Time (ms)"),
    ]));

    let mut rows: Vec<(&str, &str, PerConstraintStats)> = Vec::new();
    for (id, entry) in &stats.arc_stats {
        let descriptor = &arcs[*id].descriptor;
        rows.push((&descriptor.name, &descriptor.description, *entry));
    }
    for (id, entry) in &stats.constraint_stats {
        let descriptor = &constraints[*id].descriptor;
        rows.push((&descriptor.name, &descriptor.description, *entry));
    }
    rows.sort_by_key(|(_, _, entry)| entry.time_spent_micros);

    for (name, description, entry) in rows {
        let avg_time = if entry.revisions > 0 {
            entry.time_spent_micros as f64 / entry.revisions as f64
        } else {
            0.0
        };
        table.add_row(Row::new(vec![
            Cell::new(name),
            Cell::new(description),
            Cell::new(&entry.revisions.to_string()),
            Cell::new(&entry.prunings.to_string()),
            Cell::new(&format!("{:.2}", avg_time)),
            Cell::new(&format!("{:.2}", entry.time_spent_micros as f64 / 1000.0)),
        ]));
    }

    table.to_string()
}
