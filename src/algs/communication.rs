//! Inter-partition communication maps.
//!
//! For a target partition `p`, every contained node is classified as
//! *internal* (no other partition contains it) or *boundary* (shared with at
//! least one other partition). The builder then fixes the final local node
//! numbering, internal nodes first and boundary nodes after them, both in
//! ascending global order, and lists the shared nodes per neighbour.
//!
//! Two passes over the global node range:
//!
//! 1. classify and size: boundary flag per node, shared count per partition;
//! 2. number and fill: assign local ids and push boundary nodes into the
//!    neighbour lists, which were allocated with exactly the pass-1 counts.
//!
//! Pass 2 re-derives the classification instead of trusting pass 1, and the
//! two are compared entry by entry; any disagreement is reported as a
//! [`MeshDecompError::CountMismatch`].

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshDecompError;
use crate::algs::renumber::LocalIndexMap;
use serde::{Deserialize, Serialize};

/// Shared nodes between this partition and one neighbour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborNodes {
    /// Neighbour partition id.
    pub partition: usize,
    /// Local ids (in this partition's numbering) of the shared nodes,
    /// ordered by ascending global id.
    pub local_nodes: Vec<usize>,
}

impl NeighborNodes {
    pub fn len(&self) -> usize {
        self.local_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_nodes.is_empty()
    }

    /// Partition on the other side of each shared node, entry by entry.
    pub fn proc_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.local_nodes.iter().map(move |_| self.partition)
    }
}

/// Node classification and neighbour lists of one partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationMap {
    pub partition: usize,
    pub internal_count: usize,
    pub boundary_count: usize,
    /// Neighbours in ascending partition order.
    pub neighbors: Vec<NeighborNodes>,
}

impl CommunicationMap {
    pub fn local_node_count(&self) -> usize {
        self.internal_count + self.boundary_count
    }

    pub fn neighbor_ids(&self) -> Vec<usize> {
        self.neighbors.iter().map(|n| n.partition).collect()
    }

    pub fn neighbor(&self, partition: usize) -> Option<&NeighborNodes> {
        self.neighbors.iter().find(|n| n.partition == partition)
    }

    /// Local ids of the internal nodes: always `0..internal_count`.
    pub fn internal_nodes(&self) -> std::ops::Range<usize> {
        0..self.internal_count
    }

    /// Local ids of the boundary nodes.
    pub fn boundary_nodes(&self) -> std::ops::Range<usize> {
        self.internal_count..self.local_node_count()
    }
}

impl DebugInvariants for CommunicationMap {
    fn validate_invariants(&self) -> Result<(), MeshDecompError> {
        let mut prev: Option<usize> = None;
        for nb in &self.neighbors {
            if nb.partition == self.partition || prev.is_some_and(|p| p >= nb.partition) {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "partition {}: neighbour list not strictly ascending at {}",
                    self.partition, nb.partition
                )));
            }
            prev = Some(nb.partition);
            if nb.local_nodes.is_empty() {
                return Err(MeshDecompError::CountMismatch {
                    partition: self.partition,
                    what: "neighbour shared-node",
                    expected: 1,
                    found: 0,
                });
            }
            if let Some(&bad) = nb
                .local_nodes
                .iter()
                .find(|&&l| !self.boundary_nodes().contains(&l))
            {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "partition {}: shared node {bad} for neighbour {} is not a boundary node",
                    self.partition, nb.partition
                )));
            }
            if nb.local_nodes.windows(2).any(|w| w[0] >= w[1]) {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "partition {}: shared nodes for neighbour {} not ascending",
                    self.partition, nb.partition
                )));
            }
        }
        Ok(())
    }
}

/// Communication map together with the canonical local node order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommMapBuild {
    pub comm: CommunicationMap,
    /// `node_order[l]` is the global id of local node `l`.
    pub node_order: Vec<usize>,
}

fn mismatch(partition: usize, what: &'static str, expected: usize, found: usize) -> MeshDecompError {
    MeshDecompError::CountMismatch {
        partition,
        what,
        expected,
        found,
    }
}

/// Build the communication map of `partition` from the node masks of *all*
/// partitions.
pub fn build_comm_map<M: AsRef<[bool]>>(
    node_masks: &[M],
    partition: usize,
) -> Result<CommMapBuild, MeshDecompError> {
    let n_parts = node_masks.len();
    let Some(mine) = node_masks.get(partition).map(AsRef::as_ref) else {
        return Err(MeshDecompError::UnknownPartition { partition, n_parts });
    };
    let n_nodes = mine.len();
    if let Some((q, m)) = node_masks
        .iter()
        .enumerate()
        .find(|(_, m)| m.as_ref().len() != n_nodes)
    {
        return Err(MeshDecompError::InvalidMesh(format!(
            "node mask of partition {q} covers {} nodes, partition {partition} covers {n_nodes}",
            m.as_ref().len()
        )));
    }

    // Pass 1: classification + sizing.
    let mut shared_counts = vec![0usize; n_parts];
    let mut is_boundary = vec![false; n_nodes];
    let mut internal_count = 0;
    let mut boundary_count = 0;
    for i in (0..n_nodes).filter(|&i| mine[i]) {
        let mut marked = false;
        for (q, other) in node_masks.iter().enumerate() {
            if q == partition {
                continue;
            }
            if other.as_ref()[i] {
                if !marked {
                    boundary_count += 1;
                    marked = true;
                }
                shared_counts[q] += 1;
            }
        }
        if marked {
            is_boundary[i] = true;
        } else {
            internal_count += 1;
        }
    }

    // Neighbours: every partition with a non-zero shared count, ascending.
    let mut slot_of = vec![None; n_parts];
    let mut neighbors = Vec::new();
    for (q, &count) in shared_counts.iter().enumerate().filter(|&(_, &c)| c > 0) {
        slot_of[q] = Some(neighbors.len());
        neighbors.push(NeighborNodes {
            partition: q,
            local_nodes: Vec::with_capacity(count),
        });
    }

    // Pass 2: local numbering + fill.
    let mut node_order = vec![0usize; internal_count + boundary_count];
    let mut next_internal = 0;
    let mut next_boundary = internal_count;
    for i in (0..n_nodes).filter(|&i| mine[i]) {
        let local = if is_boundary[i] {
            next_boundary
        } else {
            next_internal
        };
        let mut marked = false;
        for (q, other) in node_masks.iter().enumerate() {
            if q == partition {
                continue;
            }
            if other.as_ref()[i] && mine[i] {
                marked = true;
                let slot = slot_of[q].ok_or_else(|| mismatch(partition, "neighbour shared-node", 0, 1))?;
                neighbors[slot].local_nodes.push(local);
            }
        }
        if marked != is_boundary[i] {
            return Err(MeshDecompError::InvalidOrdering(format!(
                "partition {partition}: node {i} classified {} in pass 1 and {} in pass 2",
                if is_boundary[i] { "boundary" } else { "internal" },
                if marked { "boundary" } else { "internal" },
            )));
        }
        if marked {
            if next_boundary >= node_order.len() {
                return Err(mismatch(partition, "boundary node", boundary_count, next_boundary + 1 - internal_count));
            }
            node_order[next_boundary] = i;
            next_boundary += 1;
        } else {
            if next_internal >= internal_count {
                return Err(mismatch(partition, "internal node", internal_count, next_internal + 1));
            }
            node_order[next_internal] = i;
            next_internal += 1;
        }
    }

    if next_internal != internal_count {
        return Err(mismatch(partition, "internal node", internal_count, next_internal));
    }
    if next_boundary - internal_count != boundary_count {
        return Err(mismatch(
            partition,
            "boundary node",
            boundary_count,
            next_boundary - internal_count,
        ));
    }
    for nb in &neighbors {
        if nb.local_nodes.len() != shared_counts[nb.partition] {
            return Err(mismatch(
                partition,
                "neighbour shared-node",
                shared_counts[nb.partition],
                nb.local_nodes.len(),
            ));
        }
    }

    let comm = CommunicationMap {
        partition,
        internal_count,
        boundary_count,
        neighbors,
    };
    crate::debug_invariants!(comm.validate_invariants(), "communication map");
    Ok(CommMapBuild { comm, node_order })
}

/// Check that every pair of neighbouring partitions lists the same global
/// nodes for each other, in the same order.
///
/// `node_maps[p]` must be the final node numbering of partition `p`.
pub fn check_symmetry(
    comms: &[CommunicationMap],
    node_maps: &[LocalIndexMap],
) -> Result<(), MeshDecompError> {
    let to_globals = |p: usize, nb: &NeighborNodes| -> Result<Vec<usize>, MeshDecompError> {
        nb.local_nodes
            .iter()
            .map(|&l| {
                node_maps[p].to_global(l).ok_or_else(|| {
                    MeshDecompError::InvalidOrdering(format!(
                        "partition {p}: shared local node {l} has no global id"
                    ))
                })
            })
            .collect()
    };
    for comm in comms {
        let p = comm.partition;
        for nb in &comm.neighbors {
            let q = nb.partition;
            let back = comms
                .get(q)
                .and_then(|c| c.neighbor(p))
                .ok_or_else(|| mismatch(q, "neighbour shared-node", nb.len(), 0))?;
            if back.len() != nb.len() {
                return Err(mismatch(q, "neighbour shared-node", nb.len(), back.len()));
            }
            let here = to_globals(p, nb)?;
            let there = to_globals(q, back)?;
            if here != there {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "partitions {p} and {q} disagree on their shared nodes"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two quads side by side, nodes 0..6:
    //   0 - 1 - 2
    //   |   |   |
    //   3 - 4 - 5
    // partition 0 owns the left quad, partition 1 the right one.
    fn strip_masks() -> Vec<Vec<bool>> {
        vec![
            vec![true, true, false, true, true, false],
            vec![false, true, true, false, true, true],
        ]
    }

    #[test]
    fn two_quad_strip() {
        let masks = strip_masks();
        let b0 = build_comm_map(&masks, 0).unwrap();
        assert_eq!(b0.comm.internal_count, 2);
        assert_eq!(b0.comm.boundary_count, 2);
        assert_eq!(b0.comm.neighbor_ids(), vec![1]);
        assert_eq!(b0.comm.neighbors[0].local_nodes, vec![2, 3]);
        assert_eq!(b0.node_order, vec![0, 3, 1, 4]);
        assert_eq!(b0.comm.neighbors[0].proc_ids().collect::<Vec<_>>(), vec![1, 1]);

        let b1 = build_comm_map(&masks, 1).unwrap();
        assert_eq!(b1.comm.internal_count, 2);
        assert_eq!(b1.comm.boundary_count, 2);
        assert_eq!(b1.comm.neighbor_ids(), vec![0]);
        assert_eq!(b1.node_order, vec![2, 5, 1, 4]);
    }

    #[test]
    fn single_partition_has_no_boundary() {
        let masks = vec![vec![true; 5]];
        let b = build_comm_map(&masks, 0).unwrap();
        assert_eq!(b.comm.internal_count, 5);
        assert_eq!(b.comm.boundary_count, 0);
        assert!(b.comm.neighbors.is_empty());
        assert_eq!(b.node_order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn corner_node_shared_by_three() {
        // node 0 in all three, node 1 only in 0 and 2, node 2 only in 1
        let masks = vec![
            vec![true, true, false, true],
            vec![true, false, true, false],
            vec![true, true, false, false],
        ];
        let b0 = build_comm_map(&masks, 0).unwrap();
        assert_eq!((b0.comm.internal_count, b0.comm.boundary_count), (1, 2));
        assert_eq!(b0.node_order, vec![3, 0, 1]);
        assert_eq!(b0.comm.neighbor_ids(), vec![1, 2]);
        assert_eq!(b0.comm.neighbor(1).unwrap().local_nodes, vec![1]);
        assert_eq!(b0.comm.neighbor(2).unwrap().local_nodes, vec![1, 2]);

        let builds: Vec<_> = (0..3).map(|p| build_comm_map(&masks, p).unwrap()).collect();
        let comms: Vec<_> = builds.iter().map(|b| b.comm.clone()).collect();
        let maps: Vec<_> = builds
            .iter()
            .zip(&masks)
            .map(|(b, m)| {
                let mut map = LocalIndexMap::from_mask(m);
                map.reorder(&b.node_order).unwrap();
                map
            })
            .collect();
        check_symmetry(&comms, &maps).unwrap();
    }

    #[test]
    fn symmetry_check_catches_one_sided_neighbor() {
        let masks = strip_masks();
        let b0 = build_comm_map(&masks, 0).unwrap();
        let mut b1 = build_comm_map(&masks, 1).unwrap();
        b1.comm.neighbors.clear();
        let maps: Vec<_> = [&b0, &b1]
            .iter()
            .zip(&masks)
            .map(|(b, m)| {
                let mut map = LocalIndexMap::from_mask(m);
                map.reorder(&b.node_order).unwrap();
                map
            })
            .collect();
        assert!(check_symmetry(&[b0.comm, b1.comm], &maps).is_err());
    }

    #[test]
    fn mismatched_mask_lengths_rejected() {
        let masks = vec![vec![true; 3], vec![true; 4]];
        assert!(matches!(
            build_comm_map(&masks, 0),
            Err(MeshDecompError::InvalidMesh(_))
        ));
        assert!(matches!(
            build_comm_map(&masks, 5),
            Err(MeshDecompError::UnknownPartition { partition: 5, n_parts: 2 })
        ));
    }
}
