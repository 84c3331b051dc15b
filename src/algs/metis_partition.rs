//! METIS-backed [`Partitioner`].
//!
//! Recursive bisection maps to `METIS_PartGraphRecursive`, k-way to
//! `METIS_PartGraphKway`; the contiguity hint becomes the `CONTIG` option.

use crate::algs::dual_graph::AdjacencyGraph;
use crate::partitioning::error::PartitionerError;
use crate::partitioning::{PartitionRequest, PartitionStrategy, Partitioner};
use metis::Idx;

/// A wrapper around the METIS graph partitioning routines.
#[derive(Clone, Debug, Default)]
pub struct MetisPartitioner;

fn to_idx(value: usize, what: &str) -> Result<Idx, PartitionerError> {
    Idx::try_from(value)
        .map_err(|_| PartitionerError::InvalidGraph(format!("{what} {value} exceeds METIS index range")))
}

impl Partitioner for MetisPartitioner {
    fn name(&self) -> &str {
        "METIS"
    }

    fn partition(
        &self,
        graph: &AdjacencyGraph,
        request: &PartitionRequest,
    ) -> Result<Vec<usize>, PartitionerError> {
        let n = graph.num_vertices();
        if n == 0 {
            return Err(PartitionerError::EmptyGraph);
        }
        let xadj = graph
            .xadj
            .iter()
            .map(|&u| to_idx(u, "row pointer"))
            .collect::<Result<Vec<_>, _>>()?;
        let adjncy = graph
            .adjncy
            .iter()
            .map(|&v| to_idx(v, "vertex"))
            .collect::<Result<Vec<_>, _>>()?;
        let vwgt: Vec<Idx> = graph.vwgt.iter().map(|&w| w as Idx).collect();
        let nparts = to_idx(request.n_parts, "part count")?;
        let mut part: Vec<Idx> = vec![0; n];

        let metis_graph = metis::Graph::new(1, nparts, &xadj, &adjncy)
            .map_err(|e| PartitionerError::Metis(e.to_string()))?
            .set_vwgt(&vwgt)
            .set_option(metis::option::Contig(request.contiguous));
        let objval = match request.strategy {
            PartitionStrategy::RecursiveBisection => metis_graph.part_recursive(&mut part),
            PartitionStrategy::KWay => metis_graph.part_kway(&mut part),
        }
        .map_err(|e| PartitionerError::Metis(e.to_string()))?;
        log::debug!("METIS {} objective {objval}", request.strategy);

        part.into_iter()
            .enumerate()
            .map(|(element, p)| {
                usize::try_from(p).map_err(|_| PartitionerError::PartOutOfRange {
                    element,
                    part: usize::MAX,
                    n_parts: request.n_parts,
                })
            })
            .collect()
    }
}
