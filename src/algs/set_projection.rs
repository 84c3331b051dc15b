//! Restriction of global node-sets and side-sets to one partition.
//!
//! Output uses the concatenated layout expected by Exodus-style writers: all
//! sets of one kind share flat entry / side / distance-factor arrays, and the
//! per-set `entry_index` / `dist_index` are prefix sums of the per-set counts.
//! Side-set entries carry a variable number of distance factors (one per node
//! on the face), so every count is computed across all sets before any array
//! is filled.

use crate::debug_invariants::DebugInvariants;
use crate::algs::membership::PartitionMembership;
use crate::algs::renumber::LocalIndexMap;
use crate::mesh_error::MeshDecompError;
use crate::topology::cell_type::ElementShape;
use crate::topology::mesh::{Mesh, NodeSet, SideSet};
use serde::{Deserialize, Serialize};

/// Distance factor written when the global set carries none.
pub const DEFAULT_DIST_FACTOR: f64 = 1.0;

/// Element-shape lookup used to size side-set distance factors.
pub trait ElementShapeLookup {
    fn element_shape(&self, element: usize) -> Result<ElementShape, MeshDecompError>;

    /// Nodes on the 1-based `side` of `element`.
    fn side_node_count(&self, element: usize, side: usize) -> Result<usize, MeshDecompError> {
        let shape = self.element_shape(element)?;
        shape
            .side_node_count(side)
            .ok_or_else(|| MeshDecompError::SideOutOfRange {
                element,
                side,
                shape: shape.to_string(),
            })
    }
}

impl ElementShapeLookup for Mesh {
    fn element_shape(&self, element: usize) -> Result<ElementShape, MeshDecompError> {
        Mesh::element_shape(self, element)
    }
}

/// One set restricted to a partition, in local numbering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestrictedSet {
    pub id: i64,
    /// Local node ids (node-sets) or local element ids (side-sets).
    pub entries: Vec<usize>,
    /// Side ids, parallel to `entries`; empty for node-sets.
    pub sides: Vec<usize>,
    pub dist_factors: Vec<f64>,
}

impl RestrictedSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dist_factor_count(&self) -> usize {
        self.dist_factors.len()
    }
}

/// All sets of one kind, concatenated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcatSets {
    pub ids: Vec<i64>,
    pub entries_per_set: Vec<usize>,
    pub dist_per_set: Vec<usize>,
    pub entry_index: Vec<usize>,
    pub dist_index: Vec<usize>,
    /// Local node ids (node-sets) or local element ids (side-sets).
    pub entry_list: Vec<usize>,
    /// Side ids for side-sets; empty for node-sets.
    pub extra_list: Vec<usize>,
    pub dist_factors: Vec<f64>,
}

impl ConcatSets {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.entry_list.len()
    }

    /// Copy out set `i`.
    pub fn restricted(&self, i: usize) -> Option<RestrictedSet> {
        let id = *self.ids.get(i)?;
        let entries = self.entry_index[i]..self.entry_index[i] + self.entries_per_set[i];
        let dists = self.dist_index[i]..self.dist_index[i] + self.dist_per_set[i];
        Some(RestrictedSet {
            id,
            entries: self.entry_list[entries.clone()].to_vec(),
            sides: if self.extra_list.is_empty() {
                Vec::new()
            } else {
                self.extra_list[entries].to_vec()
            },
            dist_factors: self.dist_factors[dists].to_vec(),
        })
    }

    fn with_counts(ids: Vec<i64>, entries_per_set: Vec<usize>, dist_per_set: Vec<usize>) -> Self {
        let entry_index = prefix_sums(&entries_per_set);
        let dist_index = prefix_sums(&dist_per_set);
        let total_entries = entries_per_set.iter().sum();
        let total_dists = dist_per_set.iter().sum();
        Self {
            ids,
            entries_per_set,
            dist_per_set,
            entry_index,
            dist_index,
            entry_list: Vec::with_capacity(total_entries),
            extra_list: Vec::new(),
            dist_factors: Vec::with_capacity(total_dists),
        }
    }
}

impl DebugInvariants for ConcatSets {
    fn validate_invariants(&self) -> Result<(), MeshDecompError> {
        let n = self.ids.len();
        for (what, len) in [
            ("entries_per_set", self.entries_per_set.len()),
            ("dist_per_set", self.dist_per_set.len()),
            ("entry_index", self.entry_index.len()),
            ("dist_index", self.dist_index.len()),
        ] {
            if len != n {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "{what} has {len} entries for {n} sets"
                )));
            }
        }
        if self.entry_index != prefix_sums(&self.entries_per_set)
            || self.dist_index != prefix_sums(&self.dist_per_set)
        {
            return Err(MeshDecompError::InvalidOrdering(
                "set indices are not prefix sums of set counts".into(),
            ));
        }
        let entries: usize = self.entries_per_set.iter().sum();
        let dists: usize = self.dist_per_set.iter().sum();
        if self.entry_list.len() != entries
            || (!self.extra_list.is_empty() && self.extra_list.len() != entries)
            || self.dist_factors.len() != dists
        {
            return Err(MeshDecompError::InvalidOrdering(
                "flattened set arrays disagree with set counts".into(),
            ));
        }
        Ok(())
    }
}

fn prefix_sums(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0, |acc, &c| {
            let start = *acc;
            *acc += c;
            Some(start)
        })
        .collect()
}

/// Restrict every node-set to the nodes contained in the partition.
///
/// Each retained node keeps its single distance factor.
pub fn concat_node_sets(
    sets: &[NodeSet],
    node_mask: &[bool],
    node_map: &LocalIndexMap,
    partition: usize,
) -> Result<ConcatSets, MeshDecompError> {
    let n_nodes = node_mask.len();

    // Pass 1: sizes.
    let mut counts = Vec::with_capacity(sets.len());
    for set in sets {
        let mut count = 0;
        for &node in &set.nodes {
            let inside = *node_mask.get(node).ok_or_else(|| {
                MeshDecompError::node_oob(format!("node set {}", set.id), node, n_nodes)
            })?;
            if inside {
                count += 1;
            }
        }
        counts.push(count);
    }
    let mut out = ConcatSets::with_counts(
        sets.iter().map(|s| s.id).collect(),
        counts.clone(),
        counts,
    );

    // Pass 2: fill.
    for set in sets {
        for (k, &node) in set.nodes.iter().enumerate() {
            if !node_mask[node] {
                continue;
            }
            let local = node_map
                .to_local(node)
                .ok_or(MeshDecompError::UnmappedNode { partition, node })?;
            out.entry_list.push(local);
            out.dist_factors
                .push(set.dist_factors.get(k).copied().unwrap_or(DEFAULT_DIST_FACTOR));
        }
    }

    if out.entry_list.len() != out.entries_per_set.iter().sum::<usize>() {
        return Err(MeshDecompError::CountMismatch {
            partition,
            what: "node-set entry",
            expected: out.entries_per_set.iter().sum(),
            found: out.entry_list.len(),
        });
    }
    crate::debug_invariants!(out.validate_invariants(), "node sets");
    Ok(out)
}

/// Restrict every side-set to the entries whose element the partition owns.
///
/// The distance-factor count of an entry is the node count of its face.
pub fn concat_side_sets<L: ElementShapeLookup + ?Sized>(
    sets: &[SideSet],
    element_mask: &[bool],
    element_map: &LocalIndexMap,
    shapes: &L,
    partition: usize,
) -> Result<ConcatSets, MeshDecompError> {
    let n_elems = element_mask.len();

    // Pass 1: sizes, across all sets.
    let mut side_counts = Vec::with_capacity(sets.len());
    let mut dist_counts = Vec::with_capacity(sets.len());
    for set in sets {
        let (mut sides, mut dists) = (0, 0);
        for (&elem, &side) in set.elements.iter().zip(&set.sides) {
            let owned = *element_mask.get(elem).ok_or_else(|| {
                MeshDecompError::element_oob(format!("side set {}", set.id), elem, n_elems)
            })?;
            if owned {
                sides += 1;
                dists += shapes.side_node_count(elem, side)?;
            }
        }
        side_counts.push(sides);
        dist_counts.push(dists);
    }
    let mut out = ConcatSets::with_counts(
        sets.iter().map(|s| s.id).collect(),
        side_counts,
        dist_counts,
    );
    out.extra_list.reserve_exact(out.entry_list.capacity());

    // Pass 2: fill.
    for set in sets {
        let mut df_cursor = 0;
        for (&elem, &side) in set.elements.iter().zip(&set.sides) {
            let per_side = shapes.side_node_count(elem, side)?;
            let df_range = df_cursor..df_cursor + per_side;
            df_cursor += per_side;
            if !element_mask[elem] {
                continue;
            }
            let local = element_map
                .to_local(elem)
                .ok_or(MeshDecompError::UnmappedElement {
                    partition,
                    element: elem,
                })?;
            out.entry_list.push(local);
            out.extra_list.push(side);
            match set.dist_factors.get(df_range) {
                Some(values) => out.dist_factors.extend_from_slice(values),
                None => out
                    .dist_factors
                    .extend(std::iter::repeat_n(DEFAULT_DIST_FACTOR, per_side)),
            }
        }
    }

    let expected: usize = out.dist_per_set.iter().sum();
    if out.dist_factors.len() != expected {
        return Err(MeshDecompError::CountMismatch {
            partition,
            what: "side-set distance factor",
            expected,
            found: out.dist_factors.len(),
        });
    }
    crate::debug_invariants!(out.validate_invariants(), "side sets");
    Ok(out)
}

/// Restrict a single node-set.
pub fn project_node_set(
    set: &NodeSet,
    node_mask: &[bool],
    node_map: &LocalIndexMap,
    partition: usize,
) -> Result<RestrictedSet, MeshDecompError> {
    let concat = concat_node_sets(std::slice::from_ref(set), node_mask, node_map, partition)?;
    Ok(concat.restricted(0).unwrap_or_else(|| empty_set(set.id)))
}

/// Restrict a single side-set.
pub fn project_side_set<L: ElementShapeLookup + ?Sized>(
    set: &SideSet,
    element_mask: &[bool],
    element_map: &LocalIndexMap,
    shapes: &L,
    partition: usize,
) -> Result<RestrictedSet, MeshDecompError> {
    let concat = concat_side_sets(
        std::slice::from_ref(set),
        element_mask,
        element_map,
        shapes,
        partition,
    )?;
    Ok(concat.restricted(0).unwrap_or_else(|| empty_set(set.id)))
}

fn empty_set(id: i64) -> RestrictedSet {
    RestrictedSet {
        id,
        entries: Vec::new(),
        sides: Vec::new(),
        dist_factors: Vec::new(),
    }
}

/// Fail on the first node-set entry that no partition contains.
///
/// Must run after every partition's node mask is complete.
pub fn check_node_sets_covered(
    sets: &[NodeSet],
    memberships: &[PartitionMembership],
) -> Result<(), MeshDecompError> {
    for set in sets {
        for &node in &set.nodes {
            if !memberships.iter().any(|m| m.contains_node(node)) {
                return Err(MeshDecompError::DanglingNodeSetEntry {
                    set_id: set.id,
                    node,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::mesh::ElementBlock;

    // Quad strip 0|1|2, partition 1 owns elements 1 and 2.
    //   0 - 1 - 2 - 3
    //   4 - 5 - 6 - 7
    fn strip() -> Mesh {
        let block = ElementBlock::new(
            1,
            ElementShape::Quad4,
            vec![4, 5, 1, 0, 5, 6, 2, 1, 6, 7, 3, 2],
        );
        Mesh::new("strip", 2, vec![0.0; 16], vec![block], vec![], vec![]).unwrap()
    }

    #[test]
    fn node_sets_keep_matching_entries() {
        let mask = vec![false, true, true, true, false, true, true, true];
        let map = LocalIndexMap::from_mask(&mask);
        let mut left = NodeSet::new(10, vec![0, 4]);
        left.dist_factors = vec![0.5, 0.25];
        let mut bottom = NodeSet::new(20, vec![4, 5, 6, 7]);
        bottom.dist_factors = vec![1.0, 2.0, 3.0, 4.0];
        let out = concat_node_sets(&[left, bottom], &mask, &map, 1).unwrap();
        assert_eq!(out.entries_per_set, vec![0, 3]);
        assert_eq!(out.dist_per_set, vec![0, 3]);
        assert_eq!(out.entry_index, vec![0, 0]);
        assert_eq!(out.entry_list, vec![3, 4, 5]);
        assert_eq!(out.dist_factors, vec![2.0, 3.0, 4.0]);
        assert!(out.extra_list.is_empty());
        assert!(out.validate_invariants().is_ok());
    }

    #[test]
    fn side_sets_count_face_nodes() {
        let mesh = strip();
        let mask = vec![false, true, true];
        let map = LocalIndexMap::from_mask(&mask);
        // bottom sides of all three quads, then the right end
        let bottom = SideSet::new(1, vec![0, 1, 2], vec![1, 1, 1]);
        let right = SideSet::new(2, vec![2], vec![2]);
        let out = concat_side_sets(&[bottom, right], &mask, &map, &mesh, 1).unwrap();
        assert_eq!(out.entries_per_set, vec![2, 1]);
        assert_eq!(out.dist_per_set, vec![4, 2]);
        assert_eq!(out.entry_index, vec![0, 2]);
        assert_eq!(out.dist_index, vec![0, 4]);
        assert_eq!(out.entry_list, vec![0, 1, 1]);
        assert_eq!(out.extra_list, vec![1, 1, 2]);
        assert_eq!(out.dist_factors, vec![DEFAULT_DIST_FACTOR; 6]);
        let right = out.restricted(1).unwrap();
        assert_eq!((right.id, right.entries.clone(), right.sides.clone()), (2, vec![1], vec![2]));
        assert_eq!(right.dist_factor_count(), 2);
    }

    #[test]
    fn side_set_distance_factors_follow_entries() {
        let mesh = strip();
        let mask = vec![true, false, true];
        let map = LocalIndexMap::from_mask(&mask);
        let mut ss = SideSet::new(5, vec![0, 1, 2], vec![1, 1, 3]);
        ss.dist_factors = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let set = project_side_set(&ss, &mask, &map, &mesh, 0).unwrap();
        assert_eq!(set.entries, vec![0, 1]);
        assert_eq!(set.sides, vec![1, 3]);
        assert_eq!(set.dist_factors, vec![1.0, 2.0, 5.0, 6.0]);
    }

    #[test]
    fn out_of_bounds_entries_fail_fast() {
        let mask = vec![true, true];
        let map = LocalIndexMap::from_mask(&mask);
        let err = project_node_set(&NodeSet::new(3, vec![0, 9]), &mask, &map, 0).unwrap_err();
        assert!(matches!(err, MeshDecompError::NodeOutOfBounds { node: 9, .. }));

        let mesh = strip();
        let emask = vec![true, true, true];
        let emap = LocalIndexMap::from_mask(&emask);
        let ss = SideSet::new(4, vec![7], vec![1]);
        let err = project_side_set(&ss, &emask, &emap, &mesh, 0).unwrap_err();
        assert!(matches!(err, MeshDecompError::ElementOutOfBounds { element: 7, .. }));
    }

    #[test]
    fn dangling_node_set_entry_detected() {
        let mesh = strip();
        let asg = crate::algs::membership::PartitionAssignment::new(vec![0, 0, 0], 1).unwrap();
        let memberships = crate::algs::membership::resolve_all(&mesh, &asg).unwrap();
        let sets = vec![NodeSet::new(1, vec![0, 3])];
        assert!(check_node_sets_covered(&sets, &memberships).is_ok());

        let asg = crate::algs::membership::PartitionAssignment::new(vec![0, 0, 1], 2).unwrap();
        let mut memberships = crate::algs::membership::resolve_all(&mesh, &asg).unwrap();
        memberships.truncate(1);
        assert_eq!(
            check_node_sets_covered(&sets, &memberships),
            Err(MeshDecompError::DanglingNodeSetEntry { set_id: 1, node: 3 })
        );
    }
}
