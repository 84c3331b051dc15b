//! Entry-point for element partitioning.
//!
//! The partitioner is an external collaborator: anything implementing
//! [`Partitioner`] maps the element adjacency graph to one partition id per
//! element. This module owns the policy around it (strategy selection,
//! configuration validation, the single-partition bypass and checking the
//! returned labelling).

pub mod error;
pub mod metrics;
pub mod native;

use crate::algs::dual_graph::AdjacencyGraph;
use crate::algs::membership::PartitionAssignment;
use crate::mesh_error::MeshDecompError;
use crate::partitioning::error::PartitionerError;
use crate::topology::mesh::Mesh;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use self::metrics::{edge_cut, load_imbalance, part_weights};
pub use self::native::NativePartitioner;

/// Below this many partitions `Auto` uses recursive bisection.
pub const KWAY_THRESHOLD: usize = 8;

/// How the partitioning strategy is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionMode {
    /// Recursive bisection for fewer than [`KWAY_THRESHOLD`] parts, k-way otherwise.
    #[default]
    Auto,
    ForceRecursive,
    ForceKway,
}

/// Strategy handed to the partitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionStrategy {
    RecursiveBisection,
    KWay,
}

impl DecompositionMode {
    pub fn select(self, n_parts: usize) -> PartitionStrategy {
        match self {
            DecompositionMode::ForceRecursive => PartitionStrategy::RecursiveBisection,
            DecompositionMode::ForceKway => PartitionStrategy::KWay,
            DecompositionMode::Auto if n_parts < KWAY_THRESHOLD => {
                PartitionStrategy::RecursiveBisection
            }
            DecompositionMode::Auto => PartitionStrategy::KWay,
        }
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionStrategy::RecursiveBisection => f.write_str("recursive bisection"),
            PartitionStrategy::KWay => f.write_str("k-way"),
        }
    }
}

/// Decomposition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    /// Number of partitions `P`.
    pub n_parts: usize,
    pub mode: DecompositionMode,
    /// Ask the partitioner for connected parts.
    pub contiguous: bool,
    /// Refinement sweeps for partitioners that support them.
    pub refine_passes: usize,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            n_parts: 2,
            mode: DecompositionMode::Auto,
            contiguous: true,
            refine_passes: 4,
        }
    }
}

impl DecompositionConfig {
    pub fn with_parts(n_parts: usize) -> Self {
        Self {
            n_parts,
            ..Self::default()
        }
    }

    /// Rejects `P == 0` and `P > E`.
    pub fn validate(&self, n_elements: usize) -> Result<(), MeshDecompError> {
        if self.n_parts == 0 {
            return Err(MeshDecompError::InvalidPartitionCount(self.n_parts));
        }
        if self.n_parts > n_elements {
            return Err(MeshDecompError::UnsupportedPartitionCount {
                n_parts: self.n_parts,
                elements: n_elements,
            });
        }
        Ok(())
    }

    pub fn request(&self) -> PartitionRequest {
        PartitionRequest {
            n_parts: self.n_parts,
            strategy: self.mode.select(self.n_parts),
            contiguous: self.contiguous,
            refine_passes: self.refine_passes,
        }
    }
}

/// What a [`Partitioner`] is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRequest {
    pub n_parts: usize,
    pub strategy: PartitionStrategy,
    pub contiguous: bool,
    pub refine_passes: usize,
}

/// Graph partitioning oracle.
pub trait Partitioner {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// One part id in `[0, request.n_parts)` per graph vertex.
    fn partition(
        &self,
        graph: &AdjacencyGraph,
        request: &PartitionRequest,
    ) -> Result<Vec<usize>, PartitionerError>;
}

/// Checks a labelling returned by a partitioner.
fn check_labels(parts: &[usize], n_vertices: usize, n_parts: usize) -> Result<(), PartitionerError> {
    if parts.len() != n_vertices {
        return Err(PartitionerError::ResultLength {
            expected: n_vertices,
            found: parts.len(),
        });
    }
    let mut used = vec![false; n_parts];
    for (element, &part) in parts.iter().enumerate() {
        if part >= n_parts {
            return Err(PartitionerError::PartOutOfRange {
                element,
                part,
                n_parts,
            });
        }
        used[part] = true;
    }
    match used.iter().position(|&u| !u) {
        Some(empty) => Err(PartitionerError::EmptyPart(empty)),
        None => Ok(()),
    }
}

/// Partition an already-built element graph.
pub fn partition_graph<P: Partitioner + ?Sized>(
    graph: &AdjacencyGraph,
    partitioner: &P,
    config: &DecompositionConfig,
) -> Result<PartitionAssignment, MeshDecompError> {
    let n = graph.num_vertices();
    config.validate(n)?;
    if config.n_parts == 1 {
        log::info!("single partition requested; skipping {}", partitioner.name());
        return Ok(PartitionAssignment::single(n));
    }
    let request = config.request();
    log::info!(
        "{} partitioning {n} elements into {} parts using {}",
        partitioner.name(),
        request.n_parts,
        request.strategy
    );
    let parts = partitioner.partition(graph, &request)?;
    check_labels(&parts, n, request.n_parts)?;
    log::debug!(
        "edge cut {}, load imbalance {:.3}",
        edge_cut(graph, &parts),
        load_imbalance(graph, &parts, request.n_parts)
    );
    PartitionAssignment::new(parts, request.n_parts)
}

/// Build the element adjacency graph of `mesh` and partition it.
pub fn partition_mesh<P: Partitioner + ?Sized>(
    mesh: &Mesh,
    partitioner: &P,
    config: &DecompositionConfig,
) -> Result<PartitionAssignment, MeshDecompError> {
    config.validate(mesh.num_elements())?;
    if config.n_parts == 1 {
        return Ok(PartitionAssignment::single(mesh.num_elements()));
    }
    let graph = AdjacencyGraph::from_mesh(mesh)?;
    partition_graph(&graph, partitioner, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<usize>);

    impl Partitioner for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn partition(
            &self,
            _graph: &AdjacencyGraph,
            _request: &PartitionRequest,
        ) -> Result<Vec<usize>, PartitionerError> {
            Ok(self.0.clone())
        }
    }

    fn path(n: usize) -> AdjacencyGraph {
        let mut ptr = vec![0];
        let mut adj = Vec::new();
        for v in 0..n {
            if v > 0 {
                adj.push(v as i64 - 1);
            }
            if v + 1 < n {
                adj.push(v as i64 + 1);
            }
            ptr.push(adj.len());
        }
        AdjacencyGraph::from_csr(&ptr, &adj, vec![1; n]).unwrap()
    }

    #[test]
    fn auto_mode_switches_at_eight() {
        assert_eq!(
            DecompositionMode::Auto.select(7),
            PartitionStrategy::RecursiveBisection
        );
        assert_eq!(DecompositionMode::Auto.select(8), PartitionStrategy::KWay);
        assert_eq!(
            DecompositionMode::ForceKway.select(2),
            PartitionStrategy::KWay
        );
        assert_eq!(
            DecompositionMode::ForceRecursive.select(64),
            PartitionStrategy::RecursiveBisection
        );
    }

    #[test]
    fn config_validation() {
        assert_eq!(
            DecompositionConfig::with_parts(0).validate(4),
            Err(MeshDecompError::InvalidPartitionCount(0))
        );
        let err = DecompositionConfig::with_parts(5).validate(4).unwrap_err();
        assert_eq!(err.kind(), crate::mesh_error::ErrorKind::Configuration);
        assert!(DecompositionConfig::with_parts(4).validate(4).is_ok());
    }

    #[test]
    fn config_reads_partial_json() {
        let cfg: DecompositionConfig =
            serde_json::from_str(r#"{"n_parts": 16, "mode": "force_recursive"}"#).unwrap();
        assert_eq!(cfg.n_parts, 16);
        assert_eq!(cfg.mode, DecompositionMode::ForceRecursive);
        assert!(cfg.contiguous);
    }

    #[test]
    fn single_part_bypasses_partitioner() {
        // would fail the length check if consulted
        let oracle = Fixed(vec![]);
        let a = partition_graph(&path(3), &oracle, &DecompositionConfig::with_parts(1)).unwrap();
        assert_eq!(a.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn bad_labellings_are_external_errors() {
        let cfg = DecompositionConfig::with_parts(2);
        let cases = [
            (vec![0, 1], PartitionerError::ResultLength { expected: 3, found: 2 }),
            (
                vec![0, 2, 1],
                PartitionerError::PartOutOfRange {
                    element: 1,
                    part: 2,
                    n_parts: 2,
                },
            ),
            (vec![1, 1, 1], PartitionerError::EmptyPart(0)),
        ];
        for (labels, expected) in cases {
            let err = partition_graph(&path(3), &Fixed(labels), &cfg).unwrap_err();
            assert_eq!(err.kind(), crate::mesh_error::ErrorKind::ExternalTool);
            assert_eq!(err, MeshDecompError::Partitioner(expected));
        }
    }

    #[test]
    fn native_labelling_accepted() {
        let a = partition_graph(&path(9), &NativePartitioner::default(), &DecompositionConfig::with_parts(3))
            .unwrap();
        assert_eq!(a.part_sizes(), vec![3, 3, 3]);
    }
}
