//! Native graph partitioner.
//!
//! A deterministic stand-in for METIS, used when the `metis-support` feature
//! is off. Both strategies work on breadth-first orderings started from a
//! pseudo-peripheral vertex, which keeps each part a connected band of the
//! dual graph on connected meshes.
//!
//! * Recursive bisection splits the current vertex set in two along its BFS
//!   order at the weight target `left_parts / n_parts`, then recurses.
//! * K-way slices one global BFS order into `n_parts` consecutive runs of
//!   roughly equal weight, followed by greedy boundary refinement passes
//!   (skipped when contiguity is requested).

use super::{PartitionRequest, PartitionStrategy, Partitioner};
use crate::algs::dual_graph::AdjacencyGraph;
use crate::partitioning::error::PartitionerError;
use crate::partitioning::metrics::part_weights;
use std::collections::VecDeque;

/// Allowed part weight above the average during refinement.
pub const IMBALANCE_TOLERANCE: f64 = 0.03;

/// Deterministic BFS-based partitioner.
#[derive(Clone, Debug, Default)]
pub struct NativePartitioner;

impl Partitioner for NativePartitioner {
    fn name(&self) -> &str {
        "native"
    }

    fn partition(
        &self,
        graph: &AdjacencyGraph,
        request: &PartitionRequest,
    ) -> Result<Vec<usize>, PartitionerError> {
        let n = graph.num_vertices();
        if n == 0 {
            return Err(PartitionerError::EmptyGraph);
        }
        if graph.xadj.len() != n + 1 || graph.xadj[n] != graph.adjncy.len() {
            return Err(PartitionerError::InvalidGraph(format!(
                "{} row pointers and {} neighbours for {n} vertices",
                graph.xadj.len(),
                graph.adjncy.len()
            )));
        }
        if request.n_parts == 0 || request.n_parts > n {
            return Err(PartitionerError::InvalidGraph(format!(
                "cannot form {} non-empty parts from {n} vertices",
                request.n_parts
            )));
        }

        let mut walker = BfsWalker::new(graph);
        let mut parts = vec![0usize; n];
        match request.strategy {
            PartitionStrategy::RecursiveBisection => {
                let all: Vec<usize> = (0..n).collect();
                walker.bisect(&all, request.n_parts, 0, 0, &mut parts);
            }
            PartitionStrategy::KWay => {
                let all: Vec<usize> = (0..n).collect();
                let order = walker.bfs_order(&all, 0);
                slice_by_weight(graph, &order, request.n_parts, &mut parts);
                if !request.contiguous {
                    refine(graph, &mut parts, request.n_parts, request.refine_passes);
                }
            }
        }
        Ok(parts)
    }
}

/// BFS over vertex subsets labelled by a group id, with epoch-stamped
/// visit marks so no per-call allocation of size `n` is needed.
struct BfsWalker<'g> {
    graph: &'g AdjacencyGraph,
    group: Vec<usize>,
    seen: Vec<usize>,
    epoch: usize,
    next_group: usize,
}

impl<'g> BfsWalker<'g> {
    fn new(graph: &'g AdjacencyGraph) -> Self {
        let n = graph.num_vertices();
        Self {
            graph,
            group: vec![0; n],
            seen: vec![0; n],
            epoch: 0,
            next_group: 1,
        }
    }

    /// Breadth-first order of `members` (all labelled `gid`) starting at
    /// `start`; disconnected pieces are appended from their lowest member.
    fn bfs_from(&mut self, start: usize, members: &[usize], gid: usize) -> Vec<usize> {
        self.epoch += 1;
        let epoch = self.epoch;
        let mut order = Vec::with_capacity(members.len());
        let mut queue = VecDeque::new();
        let mut seeds = std::iter::once(start).chain(members.iter().copied());
        while order.len() < members.len() {
            let Some(seed) = seeds.find(|&s| self.seen[s] != epoch) else {
                break;
            };
            self.seen[seed] = epoch;
            queue.push_back(seed);
            while let Some(u) = queue.pop_front() {
                order.push(u);
                for &v in self.graph.neighbors(u) {
                    if self.group[v] == gid && self.seen[v] != epoch {
                        self.seen[v] = epoch;
                        queue.push_back(v);
                    }
                }
            }
        }
        order
    }

    /// BFS order from a pseudo-peripheral vertex: the last vertex reached
    /// by a first sweep from the lowest member.
    fn bfs_order(&mut self, members: &[usize], gid: usize) -> Vec<usize> {
        let first = self.bfs_from(members[0], members, gid);
        let far = first.last().copied().unwrap_or(members[0]);
        self.bfs_from(far, members, gid)
    }

    fn bisect(
        &mut self,
        members: &[usize],
        n_parts: usize,
        first_part: usize,
        gid: usize,
        parts: &mut [usize],
    ) {
        if n_parts == 1 {
            for &v in members {
                parts[v] = first_part;
            }
            return;
        }
        let left_parts = n_parts / 2;
        let right_parts = n_parts - left_parts;
        let order = self.bfs_order(members, gid);

        let mut prefix = Vec::with_capacity(order.len() + 1);
        prefix.push(0i64);
        for &v in &order {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + self.graph.weight(v));
        }
        let total = prefix[order.len()];
        // split k minimising |prefix[k] / total - left_parts / n_parts|,
        // leaving at least one vertex per part on both sides
        let target = total * left_parts as i64;
        let lo = left_parts;
        let hi = order.len() - right_parts;
        let split = (lo..=hi)
            .min_by_key(|&k| (prefix[k] * n_parts as i64 - target).abs())
            .unwrap_or(lo);

        let (left, right) = order.split_at(split);
        let left_gid = self.next_group;
        let right_gid = self.next_group + 1;
        self.next_group += 2;
        for &v in left {
            self.group[v] = left_gid;
        }
        for &v in right {
            self.group[v] = right_gid;
        }
        self.bisect(left, left_parts, first_part, left_gid, parts);
        self.bisect(right, right_parts, first_part + left_parts, right_gid, parts);
    }
}

/// Cut `order` into `n_parts` consecutive runs of roughly equal weight,
/// never leaving a part empty.
fn slice_by_weight(graph: &AdjacencyGraph, order: &[usize], n_parts: usize, parts: &mut [usize]) {
    let total: i64 = order.iter().map(|&v| graph.weight(v)).sum();
    let n = order.len();
    let mut current = 0usize;
    let mut in_current = 0usize;
    let mut acc = 0i64;
    for (i, &v) in order.iter().enumerate() {
        let remaining = n - i;
        let parts_left = n_parts - 1 - current;
        let reached_target = acc * n_parts as i64 >= total * (current as i64 + 1);
        if current + 1 < n_parts && in_current > 0 && (reached_target || remaining <= parts_left) {
            current += 1;
            in_current = 0;
        }
        parts[v] = current;
        in_current += 1;
        acc += graph.weight(v);
    }
}

/// Greedy boundary refinement: move a vertex to the neighbouring part it
/// is most connected to when that lowers the cut (or keeps it and strictly
/// improves balance), respecting the load cap and never emptying a part.
fn refine(graph: &AdjacencyGraph, parts: &mut [usize], n_parts: usize, passes: usize) {
    let mut loads = part_weights(graph, parts, n_parts);
    let mut sizes = vec![0usize; n_parts];
    for &p in parts.iter() {
        sizes[p] += 1;
    }
    let total: i64 = loads.iter().sum();
    let max_vertex = (0..graph.num_vertices())
        .map(|v| graph.weight(v))
        .max()
        .unwrap_or(0);
    let cap = ((total as f64 / n_parts as f64) * (1.0 + IMBALANCE_TOLERANCE)).ceil() as i64;
    let cap = cap.max(max_vertex);

    let mut conn = vec![0i64; n_parts];
    let mut touched: Vec<usize> = Vec::new();
    for _ in 0..passes {
        let mut moved = 0usize;
        for v in 0..graph.num_vertices() {
            let from = parts[v];
            if sizes[from] == 1 {
                continue;
            }
            for &u in graph.neighbors(v) {
                let p = parts[u];
                if conn[p] == 0 {
                    touched.push(p);
                }
                conn[p] += 1;
            }
            let internal = conn[from];
            let best = touched
                .iter()
                .copied()
                .filter(|&p| p != from)
                .max_by(|&a, &b| conn[a].cmp(&conn[b]).then(b.cmp(&a)));
            let w = graph.weight(v);
            if let Some(to) = best {
                let gain = conn[to] - internal;
                let fits = loads[to] + w <= cap;
                let balances = loads[to] + w < loads[from];
                if (gain > 0 && fits) || (gain == 0 && balances) {
                    parts[v] = to;
                    loads[from] -= w;
                    loads[to] += w;
                    sizes[from] -= 1;
                    sizes[to] += 1;
                    moved += 1;
                }
            }
            for p in touched.drain(..) {
                conn[p] = 0;
            }
        }
        if moved == 0 {
            break;
        }
    }
}
