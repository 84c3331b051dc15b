//! Re-export public algorithms.

pub mod communication;
pub mod distribute;
pub mod dual_graph;
pub mod membership;
pub mod meshgen;
#[cfg(feature = "metis-support")]
pub mod metis_partition;
pub mod renumber;
pub mod set_projection;

pub use communication::{CommunicationMap, build_comm_map, check_symmetry};
pub use distribute::{Decomposition, PartitionBundle, decompose, decompose_mesh};
pub use dual_graph::AdjacencyGraph;
pub use membership::{PartitionAssignment, PartitionMembership, resolve, resolve_all};
pub use renumber::LocalIndexMap;
pub use set_projection::{ConcatSets, RestrictedSet, project_node_set, project_side_set};
