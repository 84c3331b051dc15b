//! Mesh decomposition driver.
//!
//! Splits a global [`Mesh`] into one [`PartitionBundle`] per partition: the
//! record an external writer needs to emit a partition's mesh file and
//! load-balance data.
//!
//! The run has two phases separated by a barrier:
//!
//! 1. resolve every partition's element and node masks;
//! 2. with all masks complete, build each partition's maps, communication
//!    map, restricted geometry and sets.
//!
//! With the `rayon` feature both phases run partition-parallel; each task
//! only reads the mesh and the finished masks and owns its output. The
//! first failing partition aborts the whole decomposition.

use crate::algs::communication::{CommMapBuild, CommunicationMap, build_comm_map};
use crate::algs::membership::{PartitionAssignment, PartitionMembership, resolve_all};
use crate::algs::renumber::LocalIndexMap;
use crate::algs::set_projection::{
    ConcatSets, check_node_sets_covered, concat_node_sets, concat_side_sets,
};
use crate::mesh_error::MeshDecompError;
use crate::partitioning::{DecompositionConfig, Partitioner, partition_mesh};
use crate::topology::mesh::Mesh;
use serde::{Deserialize, Serialize};

/// One element block restricted to a partition. Blocks with no element on
/// the partition are kept with `num_elements == 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBlock {
    pub id: i64,
    pub elem_type: String,
    pub nodes_per_element: usize,
    pub num_attributes: usize,
    pub num_elements: usize,
    /// Local node ids, `nodes_per_element` per element.
    pub connectivity: Vec<usize>,
}

/// Load-balance record of one partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalance {
    /// Owning partition id.
    pub owner: usize,
    pub element_count: usize,
    pub comm: CommunicationMap,
}

impl LoadBalance {
    pub fn internal_count(&self) -> usize {
        self.comm.internal_count
    }

    pub fn boundary_count(&self) -> usize {
        self.comm.boundary_count
    }

    pub fn neighbor_count(&self) -> usize {
        self.comm.neighbors.len()
    }

    pub fn neighbor_ids(&self) -> Vec<usize> {
        self.comm.neighbor_ids()
    }
}

/// Sizes of the undecomposed mesh, repeated in every partition file.
///
/// Distance-factor counts are derived from the set entries (face node
/// counts for side-sets), matching the per-partition counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalParams {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub block_ids: Vec<i64>,
    pub block_sizes: Vec<usize>,
    pub node_set_ids: Vec<i64>,
    pub node_set_entries: Vec<usize>,
    pub node_set_dist_factors: Vec<usize>,
    pub side_set_ids: Vec<i64>,
    pub side_set_entries: Vec<usize>,
    pub side_set_dist_factors: Vec<usize>,
}

impl GlobalParams {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self {
            num_nodes: mesh.num_nodes(),
            num_elements: mesh.num_elements(),
            block_ids: mesh.blocks().iter().map(|b| b.id).collect(),
            block_sizes: mesh.blocks().iter().map(|b| b.num_elements()).collect(),
            node_set_ids: mesh.node_sets().iter().map(|s| s.id).collect(),
            node_set_entries: mesh.node_sets().iter().map(|s| s.nodes.len()).collect(),
            // one factor per entry, whether or not the set carries values
            node_set_dist_factors: mesh.node_sets().iter().map(|s| s.nodes.len()).collect(),
            side_set_ids: mesh.side_sets().iter().map(|s| s.id).collect(),
            side_set_entries: mesh.side_sets().iter().map(|s| s.len()).collect(),
            side_set_dist_factors: mesh
                .side_sets()
                .iter()
                .map(|s| {
                    s.elements
                        .iter()
                        .zip(&s.sides)
                        .map(|(&e, &side)| mesh.side_node_count(e, side).unwrap_or(0))
                        .sum()
                })
                .collect(),
        }
    }
}

/// File-set description: one partition per file, parallel file type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitInfo {
    pub n_parts: usize,
    pub parts_in_file: usize,
    pub file_type: String,
}

impl InitInfo {
    pub fn parallel(n_parts: usize) -> Self {
        Self {
            n_parts,
            parts_in_file: 1,
            file_type: "p".to_string(),
        }
    }
}

/// Everything the writer needs for one partition. All ids are 0-based.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionBundle {
    pub partition: usize,
    pub title: String,
    pub dimension: usize,
    pub node_map: LocalIndexMap,
    pub element_map: LocalIndexMap,
    /// Flat coordinates of the contained nodes in final local order.
    pub coordinates: Vec<f64>,
    pub coord_names: Vec<String>,
    pub blocks: Vec<LocalBlock>,
    pub node_sets: ConcatSets,
    pub side_sets: ConcatSets,
    pub load_balance: LoadBalance,
    pub global: GlobalParams,
    pub init_info: InitInfo,
}

impl PartitionBundle {
    pub fn num_nodes(&self) -> usize {
        self.node_map.len()
    }

    pub fn num_elements(&self) -> usize {
        self.element_map.len()
    }

    pub fn node_coords(&self, local: usize) -> &[f64] {
        &self.coordinates[local * self.dimension..(local + 1) * self.dimension]
    }
}

/// Result of a decomposition run.
#[derive(Clone, Debug, PartialEq)]
pub struct Decomposition {
    pub assignment: PartitionAssignment,
    pub bundles: Vec<PartitionBundle>,
}

impl Decomposition {
    pub fn n_parts(&self) -> usize {
        self.assignment.n_parts()
    }
}

fn count_check(
    partition: usize,
    what: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), MeshDecompError> {
    if expected == found {
        Ok(())
    } else {
        Err(MeshDecompError::CountMismatch {
            partition,
            what,
            expected,
            found,
        })
    }
}

fn restrict_blocks(
    mesh: &Mesh,
    membership: &PartitionMembership,
    node_map: &LocalIndexMap,
) -> Result<Vec<LocalBlock>, MeshDecompError> {
    let partition = membership.partition;
    let mut out = Vec::with_capacity(mesh.blocks().len());
    for (b, block) in mesh.blocks().iter().enumerate() {
        let mut num_elements = 0;
        let mut connectivity = Vec::new();
        for (local, element) in mesh.block_range(b).enumerate() {
            if !membership.owns_element(element) {
                continue;
            }
            num_elements += 1;
            for &node in block.element_nodes(local) {
                let l = node_map
                    .to_local(node)
                    .ok_or(MeshDecompError::UnmappedNode { partition, node })?;
                connectivity.push(l);
            }
        }
        out.push(LocalBlock {
            id: block.id,
            elem_type: block.elem_type.clone(),
            nodes_per_element: block.nodes_per_element,
            num_attributes: block.num_attributes,
            num_elements,
            connectivity,
        });
    }
    Ok(out)
}

fn build_bundle(
    mesh: &Mesh,
    memberships: &[PartitionMembership],
    node_masks: &[&[bool]],
    global: &GlobalParams,
    partition: usize,
) -> Result<PartitionBundle, MeshDecompError> {
    let membership = &memberships[partition];

    let element_map = LocalIndexMap::from_mask(&membership.element_mask);
    count_check(partition, "element", membership.element_count, element_map.len())?;
    let mut node_map = LocalIndexMap::from_mask(&membership.node_mask);
    count_check(partition, "node", membership.node_count, node_map.len())?;

    let CommMapBuild { comm, node_order } = build_comm_map(node_masks, partition)?;
    count_check(partition, "local node", node_map.len(), comm.local_node_count())?;
    node_map.reorder(&node_order)?;

    let dim = mesh.dimension();
    let mut coordinates = Vec::with_capacity(node_map.len() * dim);
    for &g in node_map.local_to_global() {
        coordinates.extend_from_slice(mesh.node_coords(g));
    }

    let blocks = restrict_blocks(mesh, membership, &node_map)?;
    let node_sets = concat_node_sets(mesh.node_sets(), &membership.node_mask, &node_map, partition)?;
    let side_sets = concat_side_sets(
        mesh.side_sets(),
        &membership.element_mask,
        &element_map,
        mesh,
        partition,
    )?;

    log::debug!(
        "partition {partition}: {} elements, {} nodes ({} internal, {} boundary), neighbours {:?}",
        element_map.len(),
        node_map.len(),
        comm.internal_count,
        comm.boundary_count,
        comm.neighbor_ids()
    );

    Ok(PartitionBundle {
        partition,
        title: mesh.title.clone(),
        dimension: dim,
        node_map,
        element_map,
        coordinates,
        coord_names: mesh.coord_names().to_vec(),
        blocks,
        node_sets,
        side_sets,
        load_balance: LoadBalance {
            owner: partition,
            element_count: membership.element_count,
            comm,
        },
        global: global.clone(),
        init_info: InitInfo::parallel(memberships.len()),
    })
}

/// Decompose `mesh` according to an existing element assignment.
pub fn decompose(
    mesh: &Mesh,
    assignment: &PartitionAssignment,
) -> Result<Decomposition, MeshDecompError> {
    // Phase 1: every mask must be complete before any comm map reads them.
    let memberships = resolve_all(mesh, assignment)?;

    let touched = mesh.referenced_nodes();
    let orphans = touched.iter().filter(|&&t| !t).count();
    if orphans > 0 {
        log::warn!("{orphans} of {} nodes are referenced by no element", mesh.num_nodes());
    }
    check_node_sets_covered(mesh.node_sets(), &memberships)?;

    // Phase 2.
    let node_masks: Vec<&[bool]> = memberships.iter().map(|m| m.node_mask.as_slice()).collect();
    let global = GlobalParams::from_mesh(mesh);
    let n_parts = assignment.n_parts();

    #[cfg(feature = "rayon")]
    let bundles: Vec<PartitionBundle> = {
        use rayon::prelude::*;
        (0..n_parts)
            .into_par_iter()
            .map(|p| build_bundle(mesh, &memberships, &node_masks, &global, p))
            .collect::<Result<_, _>>()?
    };
    #[cfg(not(feature = "rayon"))]
    let bundles: Vec<PartitionBundle> = (0..n_parts)
        .map(|p| build_bundle(mesh, &memberships, &node_masks, &global, p))
        .collect::<Result<_, _>>()?;

    crate::debug_invariants!(
        {
            let comms: Vec<CommunicationMap> =
                bundles.iter().map(|b| b.load_balance.comm.clone()).collect();
            let maps: Vec<LocalIndexMap> = bundles.iter().map(|b| b.node_map.clone()).collect();
            crate::algs::communication::check_symmetry(&comms, &maps)
        },
        "communication symmetry"
    );

    log::info!(
        "decomposed {} elements and {} nodes into {n_parts} partitions",
        mesh.num_elements(),
        mesh.num_nodes()
    );
    Ok(Decomposition {
        assignment: assignment.clone(),
        bundles,
    })
}

/// Partition `mesh` with `partitioner` and decompose it.
pub fn decompose_mesh<P: Partitioner + ?Sized>(
    mesh: &Mesh,
    partitioner: &P,
    config: &DecompositionConfig,
) -> Result<Decomposition, MeshDecompError> {
    let assignment = partition_mesh(mesh, partitioner, config)?;
    decompose(mesh, &assignment)
}
