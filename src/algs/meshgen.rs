//! Structured mesh generators for unit-spaced quadrilateral and hexahedral
//! boxes.
//!
//! Elements are numbered row-major (x fastest) and split into blocks by
//! whole rows (quads) or layers (hexes), so block order matches element
//! order. With `boundary_sets` enabled the generators add
//!
//! * node set 1 on the `x = 0` face and node set 2 on the `x = nx` face;
//! * side set 1 on the bottom (`y = 0` / `z = 0`) and side set 2 on the top.

use crate::mesh_error::MeshDecompError;
use crate::topology::cell_type::ElementShape;
use crate::topology::mesh::{ElementBlock, Mesh, NodeSet, SideSet};

/// Optional metadata for mesh generators.
#[derive(Clone, Debug)]
pub struct MeshGenOptions {
    pub boundary_sets: bool,
    /// Number of element blocks (rows or layers are dealt out evenly).
    pub blocks: usize,
}

impl Default for MeshGenOptions {
    fn default() -> Self {
        Self {
            boundary_sets: true,
            blocks: 1,
        }
    }
}

fn invalid(message: impl Into<String>) -> MeshDecompError {
    MeshDecompError::InvalidMesh(message.into())
}

/// Split `rows` consecutive element rows of `per_row` elements into blocks.
fn split_blocks(
    shape: ElementShape,
    connectivity: Vec<usize>,
    rows: usize,
    per_row: usize,
    blocks: usize,
) -> Result<Vec<ElementBlock>, MeshDecompError> {
    if blocks == 0 || blocks > rows {
        return Err(invalid(format!("cannot deal {rows} element rows into {blocks} blocks")));
    }
    let npe = shape.node_count();
    let mut out = Vec::with_capacity(blocks);
    for b in 0..blocks {
        let start = b * rows / blocks * per_row * npe;
        let end = (b + 1) * rows / blocks * per_row * npe;
        out.push(ElementBlock::new(b as i64 + 1, shape, connectivity[start..end].to_vec()));
    }
    Ok(out)
}

/// `nx × ny` Quad4 grid on `[0, nx] × [0, ny]`.
pub fn quad_grid(nx: usize, ny: usize, opts: &MeshGenOptions) -> Result<Mesh, MeshDecompError> {
    if nx == 0 || ny == 0 {
        return Err(invalid(format!("quad grid needs positive extents, got {nx}x{ny}")));
    }
    let node = |i: usize, j: usize| j * (nx + 1) + i;
    let mut coords = Vec::with_capacity((nx + 1) * (ny + 1) * 2);
    for j in 0..=ny {
        for i in 0..=nx {
            coords.extend_from_slice(&[i as f64, j as f64]);
        }
    }
    let mut conn = Vec::with_capacity(nx * ny * 4);
    for j in 0..ny {
        for i in 0..nx {
            conn.extend_from_slice(&[node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)]);
        }
    }
    let blocks = split_blocks(ElementShape::Quad4, conn, ny, nx, opts.blocks)?;

    let (mut node_sets, mut side_sets) = (Vec::new(), Vec::new());
    if opts.boundary_sets {
        node_sets.push(NodeSet::new(1, (0..=ny).map(|j| node(0, j)).collect()));
        node_sets.push(NodeSet::new(2, (0..=ny).map(|j| node(nx, j)).collect()));
        side_sets.push(SideSet::new(1, (0..nx).collect(), vec![1; nx]));
        side_sets.push(SideSet::new(2, ((ny - 1) * nx..ny * nx).collect(), vec![3; nx]));
    }
    Mesh::new(format!("quad grid {nx}x{ny}"), 2, coords, blocks, node_sets, side_sets)
}

/// `nx × ny × nz` Hex8 grid on `[0, nx] × [0, ny] × [0, nz]`.
pub fn hex_grid(
    nx: usize,
    ny: usize,
    nz: usize,
    opts: &MeshGenOptions,
) -> Result<Mesh, MeshDecompError> {
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(invalid(format!("hex grid needs positive extents, got {nx}x{ny}x{nz}")));
    }
    let node = |i: usize, j: usize, k: usize| (k * (ny + 1) + j) * (nx + 1) + i;
    let mut coords = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1) * 3);
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                coords.extend_from_slice(&[i as f64, j as f64, k as f64]);
            }
        }
    }
    let mut conn = Vec::with_capacity(nx * ny * nz * 8);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                conn.extend_from_slice(&[
                    node(i, j, k),
                    node(i + 1, j, k),
                    node(i + 1, j + 1, k),
                    node(i, j + 1, k),
                    node(i, j, k + 1),
                    node(i + 1, j, k + 1),
                    node(i + 1, j + 1, k + 1),
                    node(i, j + 1, k + 1),
                ]);
            }
        }
    }
    let layer = nx * ny;
    let blocks = split_blocks(ElementShape::Hex8, conn, nz, layer, opts.blocks)?;

    let (mut node_sets, mut side_sets) = (Vec::new(), Vec::new());
    if opts.boundary_sets {
        let face = |i: usize| -> Vec<usize> {
            (0..=nz)
                .flat_map(|k| (0..=ny).map(move |j| (k, j)))
                .map(|(k, j)| node(i, j, k))
                .collect()
        };
        node_sets.push(NodeSet::new(1, face(0)));
        node_sets.push(NodeSet::new(2, face(nx)));
        side_sets.push(SideSet::new(1, (0..layer).collect(), vec![5; layer]));
        side_sets.push(SideSet::new(
            2,
            ((nz - 1) * layer..nz * layer).collect(),
            vec![6; layer],
        ));
    }
    Mesh::new(
        format!("hex grid {nx}x{ny}x{nz}"),
        3,
        coords,
        blocks,
        node_sets,
        side_sets,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_grid_counts() {
        let opts = MeshGenOptions {
            boundary_sets: true,
            blocks: 2,
        };
        let m = quad_grid(3, 4, &opts).unwrap();
        assert_eq!(m.num_nodes(), 20);
        assert_eq!(m.num_elements(), 12);
        assert_eq!(m.blocks().len(), 2);
        assert_eq!(m.block_of(5).unwrap(), 0);
        assert_eq!(m.block_of(6).unwrap(), 1);
        assert_eq!(m.node_sets()[1].nodes, vec![3, 7, 11, 15, 19]);
        assert_eq!(m.side_sets()[1].elements, vec![9, 10, 11]);
    }

    #[test]
    fn hex_grid_counts() {
        let m = hex_grid(2, 2, 3, &MeshGenOptions::default()).unwrap();
        assert_eq!(m.num_nodes(), 36);
        assert_eq!(m.num_elements(), 12);
        assert_eq!(m.side_sets()[0].len(), 4);
        assert_eq!(m.side_node_count(0, 5).unwrap(), 4);
        assert_eq!(m.node_sets()[0].nodes.len(), 12);
    }

    #[test]
    fn rejects_degenerate_extents() {
        assert!(quad_grid(0, 3, &MeshGenOptions::default()).is_err());
        let too_many = MeshGenOptions {
            boundary_sets: false,
            blocks: 5,
        };
        assert!(hex_grid(1, 1, 4, &too_many).is_err());
    }
}
