//! Partitioning errors for mesh-decomp

use thiserror::Error;

/// Errors reported by a partitioner collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionerError {
    /// The graph has no vertices to distribute.
    #[error("cannot partition an empty graph")]
    EmptyGraph,
    /// The CSR triple is inconsistent.
    #[error("malformed adjacency graph: {0}")]
    InvalidGraph(String),
    /// The partitioner returned a labelling of the wrong length.
    #[error("partitioner returned {found} labels for {expected} elements")]
    ResultLength { expected: usize, found: usize },
    /// The partitioner returned a label outside `[0, n_parts)`.
    #[error("partitioner placed element {element} in part {part} of {n_parts}")]
    PartOutOfRange {
        element: usize,
        part: usize,
        n_parts: usize,
    },
    /// A part received no element.
    #[error("partitioner left part {0} empty")]
    EmptyPart(usize),
    /// Failure inside METIS.
    #[error("METIS error: {0}")]
    Metis(String),
}
