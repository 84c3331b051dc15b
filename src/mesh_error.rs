//! MeshDecompError: Unified error type for mesh-decomp public APIs
//!
//! Every failure in a decomposition run is fatal for that run. The variants are
//! grouped by [`ErrorKind`] so callers can tell bad input data from bad
//! configuration from a failing collaborator (partitioner or writer).

use crate::partitioning::error::PartitionerError;
use thiserror::Error;

/// Coarse classification of a [`MeshDecompError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Indices out of bounds, violated mask invariants, failed lookups.
    DataIntegrity,
    /// Rejected before any partition work begins.
    Configuration,
    /// Reported by the partitioner or the writer and propagated unchanged.
    ExternalTool,
}

/// Unified error type for mesh-decomp operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshDecompError {
    /// A node index lies outside `[0, node_count)`.
    #[error("{context}: node {node} out of bounds (mesh has {node_count} nodes)")]
    NodeOutOfBounds {
        context: String,
        node: usize,
        node_count: usize,
    },
    /// An element index lies outside `[0, element_count)`.
    #[error("{context}: element {element} out of bounds (mesh has {element_count} elements)")]
    ElementOutOfBounds {
        context: String,
        element: usize,
        element_count: usize,
    },
    /// A side id is not valid for the element's shape.
    #[error("side {side} is not a valid side of element {element} ({shape})")]
    SideOutOfRange {
        element: usize,
        side: usize,
        shape: String,
    },
    /// The assignment maps an element to a partition outside `[0, n_parts)`.
    #[error("element {element} assigned to partition {partition}, but only {n_parts} partitions exist")]
    PartitionOutOfRange {
        element: usize,
        partition: usize,
        n_parts: usize,
    },
    /// A partition id outside `[0, n_parts)` was requested.
    #[error("partition {partition} requested, but only {n_parts} partitions exist")]
    UnknownPartition { partition: usize, n_parts: usize },
    /// The assignment does not have one entry per element.
    #[error("partition assignment has {found} entries, mesh has {expected} elements")]
    AssignmentLength { expected: usize, found: usize },
    /// Two independently derived counts disagree.
    #[error("partition {partition}: {what} count mismatch (expected {expected}, found {found})")]
    CountMismatch {
        partition: usize,
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// A node expected to be contained in the partition has no local id.
    #[error("partition {partition}: node {node} has no local id")]
    UnmappedNode { partition: usize, node: usize },
    /// An element expected to be owned by the partition has no local id.
    #[error("partition {partition}: element {element} has no local id")]
    UnmappedElement { partition: usize, element: usize },
    /// A node-set entry references a node that no partition contains.
    #[error("node set {set_id}: node {node} is not contained in any partition")]
    DanglingNodeSetEntry { set_id: i64, node: usize },
    /// A local ordering override is not a permutation of the masked entities.
    #[error("invalid local ordering: {0}")]
    InvalidOrdering(String),
    /// Structural problem in the monolithic mesh.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
    /// Partition count rejected before decomposition starts.
    #[error("invalid partition count {0}: at least one partition is required")]
    InvalidPartitionCount(usize),
    /// More partitions requested than the mesh can populate.
    #[error("cannot split {elements} elements into {n_parts} non-empty partitions")]
    UnsupportedPartitionCount { n_parts: usize, elements: usize },
    /// The partitioner collaborator failed.
    #[error("partitioner failed: {0}")]
    Partitioner(#[from] PartitionerError),
    /// The writer collaborator failed.
    #[error("partition writer failed on `{path}`: {message}")]
    Writer { path: String, message: String },
}

impl MeshDecompError {
    /// Classify this error according to the decomposition error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeshDecompError::InvalidPartitionCount(_)
            | MeshDecompError::UnsupportedPartitionCount { .. } => ErrorKind::Configuration,
            MeshDecompError::Partitioner(_) | MeshDecompError::Writer { .. } => {
                ErrorKind::ExternalTool
            }
            _ => ErrorKind::DataIntegrity,
        }
    }

    pub fn is_data_integrity(&self) -> bool {
        self.kind() == ErrorKind::DataIntegrity
    }

    pub(crate) fn node_oob(context: impl Into<String>, node: usize, node_count: usize) -> Self {
        MeshDecompError::NodeOutOfBounds {
            context: context.into(),
            node,
            node_count,
        }
    }

    pub(crate) fn element_oob(
        context: impl Into<String>,
        element: usize,
        element_count: usize,
    ) -> Self {
        MeshDecompError::ElementOutOfBounds {
            context: context.into(),
            element,
            element_count,
        }
    }
}
