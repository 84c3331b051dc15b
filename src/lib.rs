#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-decomp
//!
//! mesh-decomp splits a monolithic unstructured finite-element mesh into `P`
//! partition meshes for a distributed solver. Given an element→partition
//! assignment (from METIS or the built-in partitioner) it derives, for every
//! partition, the owned elements, the element-induced node set, a local
//! numbering with internal nodes ahead of boundary nodes, the inter-partition
//! communication map, and the node-sets and side-sets restricted to the
//! partition.
//!
//! ## Features
//! - Element dual graph construction from shared faces
//! - Pluggable partitioner (native BFS bisection / k-way, or METIS)
//! - Two-pass communication map builder with per-neighbour shared-node lists
//! - Node-set and side-set projection with recomputed distance-factor counts
//! - JSON partition writer using the `base.P.pp` naming convention
//! - Optional Rayon parallelism across partitions
//!
//! ## Determinism
//!
//! Local numberings, neighbour lists and set layouts depend only on the mesh
//! and the assignment; serial and parallel runs produce identical bundles.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-decomp = "0.1"
//! # Optional features:
//! # features = ["rayon","metis-support"]
//! ```
//!
//! ```
//! use mesh_decomp::prelude::*;
//!
//! let mesh = quad_grid(4, 2, &MeshGenOptions::default())?;
//! let config = DecompositionConfig::with_parts(2);
//! let decomposition = decompose_mesh(&mesh, &NativePartitioner::default(), &config)?;
//! for bundle in &decomposition.bundles {
//!     let lb = &bundle.load_balance;
//!     assert_eq!(lb.internal_count() + lb.boundary_count(), bundle.num_nodes());
//! }
//! # Ok::<(), MeshDecompError>(())
//! ```
//!
//! ## Invariant checking
//!
//! Numbering maps, communication maps and concatenated sets implement
//! [`DebugInvariants`]; the checks run in debug builds or with the
//! `strict-invariants` feature.

pub mod algs;
pub mod debug_invariants;
pub mod io;
pub mod mesh_error;
pub mod partitioning;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communication::{CommunicationMap, NeighborNodes};
    pub use crate::algs::distribute::{
        Decomposition, LoadBalance, LocalBlock, PartitionBundle, decompose, decompose_mesh,
    };
    pub use crate::algs::dual_graph::AdjacencyGraph;
    pub use crate::algs::membership::{PartitionAssignment, PartitionMembership};
    pub use crate::algs::meshgen::{MeshGenOptions, hex_grid, quad_grid};
    #[cfg(feature = "metis-support")]
    pub use crate::algs::metis_partition::MetisPartitioner;
    pub use crate::algs::renumber::LocalIndexMap;
    pub use crate::algs::set_projection::{ConcatSets, RestrictedSet};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::{JsonPartitionWriter, PartitionWriter, multiname, write_decomposition};
    pub use crate::mesh_error::{ErrorKind, MeshDecompError};
    pub use crate::partitioning::error::PartitionerError;
    pub use crate::partitioning::{
        DecompositionConfig, DecompositionMode, NativePartitioner, PartitionRequest,
        PartitionStrategy, Partitioner, partition_mesh,
    };
    pub use crate::topology::cell_type::ElementShape;
    pub use crate::topology::mesh::{ElementBlock, Mesh, NodeSet, SideSet};
}
