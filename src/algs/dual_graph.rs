//! Build a CSR (compressed-sparse-row) *dual graph* of a mesh.
//
// Each *element* is a vertex; an undirected edge joins two elements that
// share a full side (same node set, any orientation). Vertex weights come
// from the element blocks.
//
// Returned in METIS-ready CSR triples:
//
// * `xadj[i] .. xadj[i+1]`   = neighbour list of element *i*
// * `adjncy`                 = concatenated neighbour vertices
// * `vwgt[i]`                = vertex weight
//
// The dual graph is **symmetrised** (i↔j appear in both lists), **self-free**
// (no loops) and each neighbour list is sorted ascending.

use crate::mesh_error::MeshDecompError;
use crate::topology::mesh::Mesh;
use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// CSR element adjacency with per-element weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub vwgt: Vec<i32>, // METIS expects 32-bit weights
}

impl AdjacencyGraph {
    /// Build the face-sharing dual graph of `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Result<Self, MeshDecompError> {
        let n = mesh.num_elements();

        // 1. first-seen map: sorted side node key → element
        let mut first_side_owner: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (b, block) in mesh.blocks().iter().enumerate() {
            let range = mesh.block_range(b);
            for (local, elem) in range.enumerate() {
                let nodes = block.element_nodes(local);
                for side in 1..=block.shape.side_count() {
                    let Some(side_nodes) = block.shape.side_nodes(side) else {
                        continue;
                    };
                    let key: Vec<usize> = side_nodes.iter().map(|&i| nodes[i]).sorted().collect();
                    match first_side_owner.get(&key) {
                        // second time we see this side → undirected edge
                        Some(&other) if other != elem => {
                            adj[elem].push(other);
                            adj[other].push(elem);
                        }
                        Some(_) => {}
                        None => {
                            first_side_owner.insert(key, elem);
                        }
                    }
                }
            }
        }

        // 2. sorted, de-duplicated lists → CSR vectors
        let mut xadj = Vec::with_capacity(n + 1);
        let mut adjncy = Vec::new();
        xadj.push(0);
        for nbrs in &adj {
            adjncy.extend(nbrs.iter().copied().sorted_unstable().dedup());
            xadj.push(adjncy.len());
        }

        Ok(Self {
            xadj,
            adjncy,
            vwgt: mesh.element_weights(),
        })
    }

    /// Accept a precomputed element→element table.
    ///
    /// Negative entries mark sides without a neighbour and are dropped.
    pub fn from_csr(
        pointers: &[usize],
        neighbors: &[i64],
        vwgt: Vec<i32>,
    ) -> Result<Self, MeshDecompError> {
        let n = vwgt.len();
        if pointers.len() != n + 1 {
            return Err(MeshDecompError::InvalidMesh(format!(
                "adjacency table has {} row pointers for {n} elements",
                pointers.len()
            )));
        }
        let mut xadj = Vec::with_capacity(n + 1);
        let mut adjncy = Vec::with_capacity(neighbors.len());
        xadj.push(0);
        for (elem, bounds) in pointers.windows(2).enumerate() {
            let row = neighbors.get(bounds[0]..bounds[1]).ok_or_else(|| {
                MeshDecompError::InvalidMesh(format!(
                    "adjacency row {elem} spans {}..{} of {} entries",
                    bounds[0],
                    bounds[1],
                    neighbors.len()
                ))
            })?;
            for &other in row {
                if other < 0 {
                    continue;
                }
                let other = other as usize;
                if other >= n {
                    return Err(MeshDecompError::element_oob(
                        format!("adjacency of element {elem}"),
                        other,
                        n,
                    ));
                }
                adjncy.push(other);
            }
            xadj.push(adjncy.len());
        }
        Ok(Self { xadj, adjncy, vwgt })
    }

    pub fn num_vertices(&self) -> usize {
        self.vwgt.len()
    }

    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjncy[self.xadj[v]..self.xadj[v + 1]]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.xadj[v + 1] - self.xadj[v]
    }

    pub fn weight(&self, v: usize) -> i64 {
        i64::from(self.vwgt[v])
    }

    pub fn total_weight(&self) -> i64 {
        self.vwgt.iter().map(|&w| i64::from(w)).sum()
    }
}
