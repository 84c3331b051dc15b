//! Partitioning metrics utilities.
//!
//! Edge cut and load balance of an element labelling. Used for the
//! debug-level report after partitioning and by the tests.

use crate::algs::dual_graph::AdjacencyGraph;

/// Computes the edge cut of a partitioning (O(E)).
///
/// Each undirected edge is counted once.
pub fn edge_cut(g: &AdjacencyGraph, parts: &[usize]) -> usize {
    (0..g.num_vertices())
        .map(|u| {
            g.neighbors(u)
                .iter()
                .filter(|&&v| u < v && parts[u] != parts[v])
                .count()
        })
        .sum()
}

/// Total vertex weight assigned to each part.
pub fn part_weights(g: &AdjacencyGraph, parts: &[usize], n_parts: usize) -> Vec<i64> {
    let mut loads = vec![0i64; n_parts];
    for (v, &p) in parts.iter().enumerate() {
        loads[p] += g.weight(v);
    }
    loads
}

/// Heaviest part divided by the average part weight (1.0 is perfect).
pub fn load_imbalance(g: &AdjacencyGraph, parts: &[usize], n_parts: usize) -> f64 {
    let loads = part_weights(g, parts, n_parts);
    let total: i64 = loads.iter().sum();
    if total == 0 || n_parts == 0 {
        return 1.0;
    }
    let max = loads.iter().copied().max().unwrap_or(0);
    max as f64 * n_parts as f64 / total as f64
}
