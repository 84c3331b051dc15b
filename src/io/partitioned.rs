//! JSON writer for decomposed partitions.
//!
//! The persisted record uses 1-based ids throughout (node/element maps,
//! connectivity, set entries, shared-node lists), matching the parallel
//! file conventions downstream solvers read. Side ids are already 1-based
//! and are stored unchanged.

use crate::algs::distribute::{GlobalParams, InitInfo, PartitionBundle};
use crate::algs::set_projection::ConcatSets;
use crate::io::PartitionWriter;
use crate::mesh_error::MeshDecompError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const PARTITION_FORMAT_VERSION: u32 = 1;

/// Program identification stored with every partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub program: String,
    pub version: String,
}

impl Default for QaRecord {
    fn default() -> Self {
        Self {
            program: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Element block as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBlock {
    pub id: i64,
    pub elem_type: String,
    pub nodes_per_element: usize,
    pub num_attributes: usize,
    pub num_elements: usize,
    pub connectivity: Vec<usize>,
}

/// Concatenated sets as persisted. Index offsets stay 0-based.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSets {
    pub ids: Vec<i64>,
    pub entries_per_set: Vec<usize>,
    pub dist_per_set: Vec<usize>,
    pub entry_index: Vec<usize>,
    pub dist_index: Vec<usize>,
    pub entry_list: Vec<usize>,
    pub side_list: Vec<usize>,
    pub dist_factors: Vec<f64>,
}

impl From<&ConcatSets> for PersistedSets {
    fn from(sets: &ConcatSets) -> Self {
        Self {
            ids: sets.ids.clone(),
            entries_per_set: sets.entries_per_set.clone(),
            dist_per_set: sets.dist_per_set.clone(),
            entry_index: sets.entry_index.clone(),
            dist_index: sets.dist_index.clone(),
            entry_list: one_based(&sets.entry_list),
            side_list: sets.extra_list.clone(),
            dist_factors: sets.dist_factors.clone(),
        }
    }
}

/// Load-balance record as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedLoadBalance {
    pub owner: usize,
    pub internal_nodes: usize,
    pub border_nodes: usize,
    pub internal_elements: usize,
    pub neighbor_count: usize,
    pub neighbor_ids: Vec<usize>,
    /// Shared-node counts, one per neighbour.
    pub node_counts: Vec<usize>,
    /// Concatenated shared-node lists.
    pub node_ids: Vec<usize>,
    /// Neighbour partition of each `node_ids` entry.
    pub proc_ids: Vec<usize>,
}

/// One partition file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedPartition {
    pub version: u32,
    pub qa: QaRecord,
    pub title: String,
    pub init_info: InitInfo,
    pub global: GlobalParams,
    pub dimension: usize,
    pub coord_names: Vec<String>,
    pub coordinates: Vec<f64>,
    pub node_map: Vec<usize>,
    pub element_map: Vec<usize>,
    pub blocks: Vec<PersistedBlock>,
    pub node_sets: PersistedSets,
    pub side_sets: PersistedSets,
    pub load_balance: PersistedLoadBalance,
}

fn one_based(ids: &[usize]) -> Vec<usize> {
    ids.iter().map(|&i| i + 1).collect()
}

impl PersistedPartition {
    pub fn from_bundle(bundle: &PartitionBundle, qa: QaRecord) -> Self {
        let comm = &bundle.load_balance.comm;
        Self {
            version: PARTITION_FORMAT_VERSION,
            qa,
            title: bundle.title.clone(),
            init_info: bundle.init_info.clone(),
            global: bundle.global.clone(),
            dimension: bundle.dimension,
            coord_names: bundle.coord_names.clone(),
            coordinates: bundle.coordinates.clone(),
            node_map: one_based(bundle.node_map.local_to_global()),
            element_map: one_based(bundle.element_map.local_to_global()),
            blocks: bundle
                .blocks
                .iter()
                .map(|b| PersistedBlock {
                    id: b.id,
                    elem_type: b.elem_type.clone(),
                    nodes_per_element: b.nodes_per_element,
                    num_attributes: b.num_attributes,
                    num_elements: b.num_elements,
                    connectivity: one_based(&b.connectivity),
                })
                .collect(),
            node_sets: PersistedSets::from(&bundle.node_sets),
            side_sets: PersistedSets::from(&bundle.side_sets),
            load_balance: PersistedLoadBalance {
                owner: bundle.load_balance.owner,
                internal_nodes: comm.internal_count,
                border_nodes: comm.boundary_count,
                internal_elements: bundle.load_balance.element_count,
                neighbor_count: comm.neighbors.len(),
                neighbor_ids: comm.neighbor_ids(),
                node_counts: comm.neighbors.iter().map(|n| n.len()).collect(),
                node_ids: comm
                    .neighbors
                    .iter()
                    .flat_map(|n| n.local_nodes.iter().map(|&l| l + 1))
                    .collect(),
                proc_ids: comm.neighbors.iter().flat_map(|n| n.proc_ids()).collect(),
            },
        }
    }
}

/// Writes each partition as pretty-printed JSON.
#[derive(Clone, Debug, Default)]
pub struct JsonPartitionWriter {
    pub qa: QaRecord,
}

fn writer_error(path: &Path, message: impl ToString) -> MeshDecompError {
    MeshDecompError::Writer {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

impl PartitionWriter for JsonPartitionWriter {
    fn write_partition(&self, path: &Path, bundle: &PartitionBundle) -> Result<(), MeshDecompError> {
        let record = PersistedPartition::from_bundle(bundle, self.qa.clone());
        let bytes = serde_json::to_vec_pretty(&record).map_err(|e| writer_error(path, e))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| writer_error(path, e))?;
        }
        fs::write(path, bytes).map_err(|e| writer_error(path, e))?;
        log::debug!("wrote partition {} to {}", bundle.partition, path.display());
        Ok(())
    }
}

/// Read back a partition written by [`JsonPartitionWriter`].
pub fn read_partition(path: &Path) -> Result<PersistedPartition, MeshDecompError> {
    let bytes = fs::read(path).map_err(|e| writer_error(path, e))?;
    let record: PersistedPartition =
        serde_json::from_slice(&bytes).map_err(|e| writer_error(path, e))?;
    if record.version != PARTITION_FORMAT_VERSION {
        return Err(writer_error(
            path,
            format!("unsupported partition format version {}", record.version),
        ));
    }
    Ok(record)
}
