//! The monolithic mesh: coordinates, element blocks, node-sets and side-sets.
//!
//! Node and element indices are 0-based and dense. Elements are numbered by
//! block: block `b` owns the contiguous range `block_range(b)`. The mesh is
//! validated once in [`Mesh::new`]; all decomposition stages treat it as
//! read-only afterwards.

use crate::mesh_error::MeshDecompError;
use crate::topology::cell_type::ElementShape;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous range of elements sharing shape and attribute schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementBlock {
    pub id: i64,
    /// Element type name as stored in the source file (e.g. `"QUAD4"`).
    pub elem_type: String,
    pub shape: ElementShape,
    pub nodes_per_element: usize,
    pub num_attributes: usize,
    /// Flattened element→node table, `nodes_per_element` entries per element.
    pub connectivity: Vec<usize>,
    /// Partitioner weight applied to every element of the block.
    pub weight: i32,
}

impl ElementBlock {
    /// Block with unit weight and no attributes; the type name is the shape's
    /// Exodus name.
    pub fn new(id: i64, shape: ElementShape, connectivity: Vec<usize>) -> Self {
        Self {
            id,
            elem_type: shape.exodus_name().to_string(),
            shape,
            nodes_per_element: shape.node_count(),
            num_attributes: 0,
            connectivity,
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn num_elements(&self) -> usize {
        if self.nodes_per_element == 0 {
            0
        } else {
            self.connectivity.len() / self.nodes_per_element
        }
    }

    /// Nodes of the block-local element `local`.
    pub fn element_nodes(&self, local: usize) -> &[usize] {
        let start = local * self.nodes_per_element;
        &self.connectivity[start..start + self.nodes_per_element]
    }
}

/// Named node collection with optional per-node distance factors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSet {
    pub id: i64,
    pub nodes: Vec<usize>,
    /// Empty, or one factor per entry of `nodes`.
    pub dist_factors: Vec<f64>,
}

impl NodeSet {
    pub fn new(id: i64, nodes: Vec<usize>) -> Self {
        Self {
            id,
            nodes,
            dist_factors: Vec::new(),
        }
    }
}

/// Named (element, side) collection. Sides are 1-based.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SideSet {
    pub id: i64,
    pub elements: Vec<usize>,
    pub sides: Vec<usize>,
    /// Empty, or one factor per node of every listed side, entry after entry.
    pub dist_factors: Vec<f64>,
}

impl SideSet {
    pub fn new(id: i64, elements: Vec<usize>, sides: Vec<usize>) -> Self {
        Self {
            id,
            elements,
            sides,
            dist_factors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Validated monolithic mesh.
///
/// Deserialization goes through [`Mesh::new`], so a loaded mesh is
/// validated exactly like a constructed one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshRecord", into = "MeshRecord")]
pub struct Mesh {
    pub title: String,
    dimension: usize,
    /// Flattened coordinates, `dimension` values per node.
    coordinates: Vec<f64>,
    coord_names: Vec<String>,
    blocks: Vec<ElementBlock>,
    /// `block_offsets[b]..block_offsets[b + 1]` are the elements of block `b`.
    block_offsets: Vec<usize>,
    node_sets: Vec<NodeSet>,
    side_sets: Vec<SideSet>,
}

/// Serialized form of a [`Mesh`]; block offsets are derived on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct MeshRecord {
    title: String,
    dimension: usize,
    coordinates: Vec<f64>,
    #[serde(default)]
    coord_names: Vec<String>,
    blocks: Vec<ElementBlock>,
    #[serde(default)]
    node_sets: Vec<NodeSet>,
    #[serde(default)]
    side_sets: Vec<SideSet>,
}

impl TryFrom<MeshRecord> for Mesh {
    type Error = MeshDecompError;

    fn try_from(record: MeshRecord) -> Result<Self, Self::Error> {
        let mesh = Mesh::new(
            record.title,
            record.dimension,
            record.coordinates,
            record.blocks,
            record.node_sets,
            record.side_sets,
        )?;
        if record.coord_names.is_empty() {
            Ok(mesh)
        } else {
            mesh.with_coord_names(record.coord_names)
        }
    }
}

impl From<Mesh> for MeshRecord {
    fn from(mesh: Mesh) -> Self {
        Self {
            title: mesh.title,
            dimension: mesh.dimension,
            coordinates: mesh.coordinates,
            coord_names: mesh.coord_names,
            blocks: mesh.blocks,
            node_sets: mesh.node_sets,
            side_sets: mesh.side_sets,
        }
    }
}

impl Mesh {
    /// Assemble and validate a mesh.
    ///
    /// Fails with a data-integrity error on the first out-of-range index,
    /// inconsistent block layout or distance-factor length.
    pub fn new(
        title: impl Into<String>,
        dimension: usize,
        coordinates: Vec<f64>,
        blocks: Vec<ElementBlock>,
        node_sets: Vec<NodeSet>,
        side_sets: Vec<SideSet>,
    ) -> Result<Self, MeshDecompError> {
        if !(1..=3).contains(&dimension) {
            return Err(MeshDecompError::InvalidMesh(format!(
                "unsupported spatial dimension {dimension}"
            )));
        }
        if coordinates.len() % dimension != 0 {
            return Err(MeshDecompError::InvalidMesh(format!(
                "{} coordinate values do not divide into {dimension}-d nodes",
                coordinates.len()
            )));
        }
        let coord_names = ["x", "y", "z"][..dimension]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut block_offsets = Vec::with_capacity(blocks.len() + 1);
        block_offsets.push(0);
        for block in &blocks {
            let last = block_offsets[block_offsets.len() - 1];
            block_offsets.push(last + block.num_elements());
        }

        let mesh = Self {
            title: title.into(),
            dimension,
            coordinates,
            coord_names,
            blocks,
            block_offsets,
            node_sets,
            side_sets,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Replace the coordinate names (defaults are `x`, `y`, `z`).
    pub fn with_coord_names(mut self, names: Vec<String>) -> Result<Self, MeshDecompError> {
        if names.len() != self.dimension {
            return Err(MeshDecompError::InvalidMesh(format!(
                "{} coordinate names for a {}-d mesh",
                names.len(),
                self.dimension
            )));
        }
        self.coord_names = names;
        Ok(self)
    }

    fn validate(&self) -> Result<(), MeshDecompError> {
        let n_nodes = self.num_nodes();
        for block in &self.blocks {
            if block.nodes_per_element != block.shape.node_count() {
                return Err(MeshDecompError::InvalidMesh(format!(
                    "block {}: {} nodes per element, shape {} has {}",
                    block.id,
                    block.nodes_per_element,
                    block.shape,
                    block.shape.node_count()
                )));
            }
            if block.connectivity.len() % block.nodes_per_element != 0 {
                return Err(MeshDecompError::InvalidMesh(format!(
                    "block {}: connectivity length {} is not a multiple of {}",
                    block.id,
                    block.connectivity.len(),
                    block.nodes_per_element
                )));
            }
            if block.weight < 0 {
                return Err(MeshDecompError::InvalidMesh(format!(
                    "block {}: negative weight {}",
                    block.id, block.weight
                )));
            }
            if let Some(&bad) = block.connectivity.iter().find(|&&n| n >= n_nodes) {
                return Err(MeshDecompError::node_oob(
                    format!("element block {}", block.id),
                    bad,
                    n_nodes,
                ));
            }
        }

        for ns in &self.node_sets {
            if let Some(&bad) = ns.nodes.iter().find(|&&n| n >= n_nodes) {
                return Err(MeshDecompError::node_oob(
                    format!("node set {}", ns.id),
                    bad,
                    n_nodes,
                ));
            }
            if !ns.dist_factors.is_empty() && ns.dist_factors.len() != ns.nodes.len() {
                return Err(MeshDecompError::InvalidMesh(format!(
                    "node set {}: {} distance factors for {} nodes",
                    ns.id,
                    ns.dist_factors.len(),
                    ns.nodes.len()
                )));
            }
        }

        let n_elems = self.num_elements();
        for ss in &self.side_sets {
            if ss.elements.len() != ss.sides.len() {
                return Err(MeshDecompError::InvalidMesh(format!(
                    "side set {}: {} elements but {} sides",
                    ss.id,
                    ss.elements.len(),
                    ss.sides.len()
                )));
            }
            if let Some(&bad) = ss.elements.iter().find(|&&e| e >= n_elems) {
                return Err(MeshDecompError::element_oob(
                    format!("side set {}", ss.id),
                    bad,
                    n_elems,
                ));
            }
            let mut expected_df = 0;
            for (&elem, &side) in ss.elements.iter().zip(&ss.sides) {
                expected_df += self.side_node_count(elem, side)?;
            }
            if !ss.dist_factors.is_empty() && ss.dist_factors.len() != expected_df {
                return Err(MeshDecompError::InvalidMesh(format!(
                    "side set {}: {} distance factors, sides carry {}",
                    ss.id,
                    ss.dist_factors.len(),
                    expected_df
                )));
            }
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_nodes(&self) -> usize {
        self.coordinates.len() / self.dimension
    }

    pub fn num_elements(&self) -> usize {
        self.block_offsets[self.block_offsets.len() - 1]
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    /// Coordinates of one node.
    pub fn node_coords(&self, node: usize) -> &[f64] {
        let start = node * self.dimension;
        &self.coordinates[start..start + self.dimension]
    }

    pub fn coord_names(&self) -> &[String] {
        &self.coord_names
    }

    pub fn blocks(&self) -> &[ElementBlock] {
        &self.blocks
    }

    pub fn node_sets(&self) -> &[NodeSet] {
        &self.node_sets
    }

    pub fn side_sets(&self) -> &[SideSet] {
        &self.side_sets
    }

    /// Global element range of block `b`.
    pub fn block_range(&self, b: usize) -> Range<usize> {
        self.block_offsets[b]..self.block_offsets[b + 1]
    }

    /// Index of the block containing `element`.
    pub fn block_of(&self, element: usize) -> Result<usize, MeshDecompError> {
        if element >= self.num_elements() {
            return Err(MeshDecompError::element_oob(
                "block lookup",
                element,
                self.num_elements(),
            ));
        }
        // First offset strictly greater than `element`, minus one. Empty
        // blocks share an offset with their successor and are skipped.
        Ok(self.block_offsets.partition_point(|&o| o <= element) - 1)
    }

    /// Element→node incidence of a global element.
    pub fn element_nodes(&self, element: usize) -> Result<&[usize], MeshDecompError> {
        let b = self.block_of(element)?;
        Ok(self.blocks[b].element_nodes(element - self.block_offsets[b]))
    }

    /// Shape of a global element.
    pub fn element_shape(&self, element: usize) -> Result<ElementShape, MeshDecompError> {
        Ok(self.blocks[self.block_of(element)?].shape)
    }

    /// Distance-factor count of a side-set entry: the nodes on that face.
    pub fn side_node_count(&self, element: usize, side: usize) -> Result<usize, MeshDecompError> {
        let shape = self.element_shape(element)?;
        shape
            .side_node_count(side)
            .ok_or_else(|| MeshDecompError::SideOutOfRange {
                element,
                side,
                shape: shape.to_string(),
            })
    }

    /// Per-element partitioner weights, taken from the owning block.
    pub fn element_weights(&self) -> Vec<i32> {
        let mut weights = Vec::with_capacity(self.num_elements());
        for block in &self.blocks {
            weights.extend(std::iter::repeat_n(block.weight, block.num_elements()));
        }
        weights
    }

    /// Marks every node referenced by at least one element.
    pub fn referenced_nodes(&self) -> Vec<bool> {
        let mut touched = vec![false; self.num_nodes()];
        for block in &self.blocks {
            for &n in &block.connectivity {
                touched[n] = true;
            }
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> Mesh {
        // 0 - 1 - 2
        // |   |   |
        // 3 - 4 - 5
        let coords = vec![0., 1., 1., 1., 2., 1., 0., 0., 1., 0., 2., 0.];
        let block = ElementBlock::new(1, ElementShape::Quad4, vec![3, 4, 1, 0, 4, 5, 2, 1]);
        Mesh::new("strip", 2, coords, vec![block], vec![], vec![]).unwrap()
    }

    #[test]
    fn counts_and_lookup() {
        let mesh = two_quads();
        assert_eq!(mesh.num_nodes(), 6);
        assert_eq!(mesh.num_elements(), 2);
        assert_eq!(mesh.element_nodes(1).unwrap(), &[4, 5, 2, 1]);
        assert_eq!(mesh.block_of(1).unwrap(), 0);
        assert_eq!(mesh.node_coords(5), &[2., 0.]);
        assert_eq!(mesh.coord_names(), &["x".to_string(), "y".to_string()]);
        assert!(mesh.block_of(2).is_err());
    }

    #[test]
    fn block_of_skips_empty_blocks() {
        let coords = vec![0.0; 8];
        let a = ElementBlock::new(10, ElementShape::Bar2, vec![0, 1]);
        let empty = ElementBlock::new(20, ElementShape::Bar2, vec![]);
        let b = ElementBlock::new(30, ElementShape::Bar2, vec![1, 2, 2, 3]);
        let mesh = Mesh::new("bars", 2, coords, vec![a, empty, b], vec![], vec![]).unwrap();
        assert_eq!(mesh.block_of(0).unwrap(), 0);
        assert_eq!(mesh.block_of(1).unwrap(), 2);
        assert_eq!(mesh.block_of(2).unwrap(), 2);
        assert_eq!(mesh.block_range(1), 1..1);
    }

    #[test]
    fn rejects_out_of_bounds_connectivity() {
        let block = ElementBlock::new(1, ElementShape::Quad4, vec![0, 1, 2, 9]);
        let err = Mesh::new("bad", 2, vec![0.0; 8], vec![block], vec![], vec![]).unwrap_err();
        assert!(matches!(
            err,
            MeshDecompError::NodeOutOfBounds { node: 9, node_count: 4, .. }
        ));
    }

    #[test]
    fn rejects_bad_side_and_node_set() {
        let quad = || ElementBlock::new(1, ElementShape::Quad4, vec![0, 1, 2, 3]);
        let ss = SideSet::new(7, vec![0], vec![5]);
        let err = Mesh::new("bad", 2, vec![0.0; 8], vec![quad()], vec![], vec![ss]).unwrap_err();
        assert!(matches!(err, MeshDecompError::SideOutOfRange { side: 5, .. }));

        let ss = SideSet::new(7, vec![3], vec![1]);
        let err = Mesh::new("bad", 2, vec![0.0; 8], vec![quad()], vec![], vec![ss]).unwrap_err();
        assert!(matches!(err, MeshDecompError::ElementOutOfBounds { element: 3, .. }));

        let ns = NodeSet::new(2, vec![0, 4]);
        let err = Mesh::new("bad", 2, vec![0.0; 8], vec![quad()], vec![ns], vec![]).unwrap_err();
        assert!(matches!(err, MeshDecompError::NodeOutOfBounds { node: 4, .. }));
    }

    #[test]
    fn side_set_distance_factor_length_checked() {
        let quad = ElementBlock::new(1, ElementShape::Quad4, vec![0, 1, 2, 3]);
        let mut ss = SideSet::new(7, vec![0, 0], vec![1, 2]);
        ss.dist_factors = vec![1.0; 3];
        let err = Mesh::new("bad", 2, vec![0.0; 8], vec![quad], vec![], vec![ss]).unwrap_err();
        assert!(matches!(err, MeshDecompError::InvalidMesh(_)));
    }

    #[test]
    fn loaded_mesh_is_validated() {
        let mesh = two_quads();
        let mut json = serde_json::to_value(&mesh).unwrap();
        let back: Mesh = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, mesh);

        json["blocks"][0]["connectivity"][2] = serde_json::json!(99);
        let record: MeshRecord = serde_json::from_value(json.clone()).unwrap();
        assert!(matches!(
            Mesh::try_from(record),
            Err(MeshDecompError::NodeOutOfBounds { node: 99, node_count: 6, .. })
        ));
        let err = serde_json::from_value::<Mesh>(json).unwrap_err();
        assert!(err.to_string().contains("node 99"), "{err}");
    }

    #[test]
    fn weights_follow_blocks() {
        let a = ElementBlock::new(1, ElementShape::Bar2, vec![0, 1, 1, 2]).with_weight(3);
        let b = ElementBlock::new(2, ElementShape::Bar2, vec![2, 3]).with_weight(5);
        let mesh = Mesh::new("bars", 1, vec![0., 1., 2., 3., 4.], vec![a, b], vec![], vec![]).unwrap();
        assert_eq!(mesh.element_weights(), vec![3, 3, 5]);
        assert_eq!(mesh.referenced_nodes(), vec![true, true, true, true, false]);
    }
}
