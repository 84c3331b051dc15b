//! Element ownership and element-induced node membership of one partition.
//!
//! A node belongs to partition `p` iff at least one element owned by `p`
//! references it, so several partitions may contain the same node.

use crate::mesh_error::MeshDecompError;
use crate::topology::mesh::Mesh;
use serde::{Deserialize, Serialize};

/// Validated element→partition labelling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssignmentRecord")]
pub struct PartitionAssignment {
    parts: Vec<usize>,
    n_parts: usize,
}

#[derive(Deserialize)]
struct AssignmentRecord {
    parts: Vec<usize>,
    n_parts: usize,
}

impl TryFrom<AssignmentRecord> for PartitionAssignment {
    type Error = MeshDecompError;

    fn try_from(record: AssignmentRecord) -> Result<Self, Self::Error> {
        PartitionAssignment::new(record.parts, record.n_parts)
    }
}

impl PartitionAssignment {
    /// Wrap a raw labelling; every entry must lie in `[0, n_parts)`.
    pub fn new(parts: Vec<usize>, n_parts: usize) -> Result<Self, MeshDecompError> {
        if n_parts == 0 {
            return Err(MeshDecompError::InvalidPartitionCount(n_parts));
        }
        if let Some((element, &partition)) = parts.iter().enumerate().find(|&(_, &p)| p >= n_parts) {
            return Err(MeshDecompError::PartitionOutOfRange {
                element,
                partition,
                n_parts,
            });
        }
        Ok(Self { parts, n_parts })
    }

    /// Every element in partition 0.
    pub fn single(n_elements: usize) -> Self {
        Self {
            parts: vec![0; n_elements],
            n_parts: 1,
        }
    }

    pub fn n_parts(&self) -> usize {
        self.n_parts
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Owner of `element`.
    pub fn owner(&self, element: usize) -> Option<usize> {
        self.parts.get(element).copied()
    }

    /// Elements per partition.
    pub fn part_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_parts];
        for &p in &self.parts {
            sizes[p] += 1;
        }
        sizes
    }

    pub(crate) fn check_against(&self, mesh: &Mesh) -> Result<(), MeshDecompError> {
        if self.parts.len() != mesh.num_elements() {
            return Err(MeshDecompError::AssignmentLength {
                expected: mesh.num_elements(),
                found: self.parts.len(),
            });
        }
        Ok(())
    }
}

/// Ownership masks of one partition over the global element and node ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionMembership {
    pub partition: usize,
    pub element_mask: Vec<bool>,
    pub node_mask: Vec<bool>,
    pub element_count: usize,
    pub node_count: usize,
}

impl PartitionMembership {
    pub fn owns_element(&self, element: usize) -> bool {
        self.element_mask.get(element).copied().unwrap_or(false)
    }

    pub fn contains_node(&self, node: usize) -> bool {
        self.node_mask.get(node).copied().unwrap_or(false)
    }
}

/// Scan elements in block order and mark the ones owned by `partition`
/// together with every node they touch.
///
/// Each node is counted on first touch only.
pub fn resolve(
    mesh: &Mesh,
    assignment: &PartitionAssignment,
    partition: usize,
) -> Result<PartitionMembership, MeshDecompError> {
    assignment.check_against(mesh)?;
    if partition >= assignment.n_parts() {
        return Err(MeshDecompError::UnknownPartition {
            partition,
            n_parts: assignment.n_parts(),
        });
    }

    let parts = assignment.as_slice();
    let mut element_mask = vec![false; mesh.num_elements()];
    let mut node_mask = vec![false; mesh.num_nodes()];
    let mut element_count = 0;
    let mut node_count = 0;

    for (b, block) in mesh.blocks().iter().enumerate() {
        for (local, elem) in mesh.block_range(b).enumerate() {
            if parts[elem] != partition {
                continue;
            }
            element_mask[elem] = true;
            element_count += 1;
            for &node in block.element_nodes(local) {
                if !node_mask[node] {
                    node_mask[node] = true;
                    node_count += 1;
                }
            }
        }
    }

    Ok(PartitionMembership {
        partition,
        element_mask,
        node_mask,
        element_count,
        node_count,
    })
}

/// Resolve every partition of the assignment.
///
/// With the `rayon` feature the partitions are resolved concurrently; the
/// function returns only once every mask is complete.
pub fn resolve_all(
    mesh: &Mesh,
    assignment: &PartitionAssignment,
) -> Result<Vec<PartitionMembership>, MeshDecompError> {
    assignment.check_against(mesh)?;
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..assignment.n_parts())
            .into_par_iter()
            .map(|p| resolve(mesh, assignment, p))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..assignment.n_parts())
            .map(|p| resolve(mesh, assignment, p))
            .collect()
    }
}
