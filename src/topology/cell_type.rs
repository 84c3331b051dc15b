//! Element shape metadata: side tables for the element types found in
//! Exodus-style element blocks.
//!
//! Sides are numbered from 1 as in Exodus side sets. `side_nodes` returns the
//! element-local node indices of one side, so its length is the number of
//! distance factors a side-set entry on that side carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported element shapes, keyed by node count.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ElementShape {
    Bar2,
    Bar3,
    Tri3,
    Tri6,
    Quad4,
    Quad8,
    Quad9,
    Tet4,
    Tet10,
    Hex8,
    Hex20,
    Hex27,
    Wedge6,
}

const BAR2_SIDES: &[&[usize]] = &[&[0], &[1]];
const TRI3_SIDES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const TRI6_SIDES: &[&[usize]] = &[&[0, 1, 3], &[1, 2, 4], &[2, 0, 5]];
const QUAD4_SIDES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const QUAD8_SIDES: &[&[usize]] = &[&[0, 1, 4], &[1, 2, 5], &[2, 3, 6], &[3, 0, 7]];
const TET4_SIDES: &[&[usize]] = &[&[0, 1, 3], &[1, 2, 3], &[0, 3, 2], &[0, 2, 1]];
const TET10_SIDES: &[&[usize]] = &[
    &[0, 1, 3, 4, 8, 7],
    &[1, 2, 3, 5, 9, 8],
    &[0, 3, 2, 7, 9, 6],
    &[0, 2, 1, 6, 5, 4],
];
const HEX8_SIDES: &[&[usize]] = &[
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[0, 4, 7, 3],
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
];
const HEX20_SIDES: &[&[usize]] = &[
    &[0, 1, 5, 4, 8, 13, 16, 12],
    &[1, 2, 6, 5, 9, 14, 17, 13],
    &[2, 3, 7, 6, 10, 15, 18, 14],
    &[0, 4, 7, 3, 12, 19, 15, 11],
    &[0, 3, 2, 1, 11, 10, 9, 8],
    &[4, 5, 6, 7, 16, 17, 18, 19],
];
// Face-centre nodes: 21 (-z), 22 (+z), 23 (-x), 24 (+x), 25 (-y), 26 (+y).
const HEX27_SIDES: &[&[usize]] = &[
    &[0, 1, 5, 4, 8, 13, 16, 12, 25],
    &[1, 2, 6, 5, 9, 14, 17, 13, 24],
    &[2, 3, 7, 6, 10, 15, 18, 14, 26],
    &[0, 4, 7, 3, 12, 19, 15, 11, 23],
    &[0, 3, 2, 1, 11, 10, 9, 8, 21],
    &[4, 5, 6, 7, 16, 17, 18, 19, 22],
];
const WEDGE6_SIDES: &[&[usize]] = &[
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[0, 3, 5, 2],
    &[0, 2, 1],
    &[3, 4, 5],
];

impl ElementShape {
    /// Resolve an Exodus element type name together with the block's
    /// nodes-per-element count.
    ///
    /// Names are matched case-insensitively on their leading letters, so
    /// `"QUAD"`, `"QUAD4"` and `"quad8"` all resolve through the node count.
    pub fn from_exodus_name(name: &str, nodes_per_element: usize) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let family: String = upper.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let shape = match (family.as_str(), nodes_per_element) {
            ("BAR" | "BEAM" | "TRUSS" | "EDGE" | "LINE", 2) => ElementShape::Bar2,
            ("BAR" | "BEAM" | "TRUSS" | "EDGE" | "LINE", 3) => ElementShape::Bar3,
            ("TRI" | "TRIANGLE", 3) => ElementShape::Tri3,
            ("TRI" | "TRIANGLE", 6) => ElementShape::Tri6,
            ("QUAD" | "QUADRILATERAL", 4) => ElementShape::Quad4,
            ("QUAD" | "QUADRILATERAL", 8) => ElementShape::Quad8,
            ("QUAD" | "QUADRILATERAL", 9) => ElementShape::Quad9,
            ("TET" | "TETRA", 4) => ElementShape::Tet4,
            ("TET" | "TETRA", 10) => ElementShape::Tet10,
            ("HEX" | "HEXAHEDRON", 8) => ElementShape::Hex8,
            ("HEX" | "HEXAHEDRON", 20) => ElementShape::Hex20,
            ("HEX" | "HEXAHEDRON", 27) => ElementShape::Hex27,
            ("WEDGE", 6) => ElementShape::Wedge6,
            _ => return None,
        };
        Some(shape)
    }

    /// Canonical Exodus type name.
    pub fn exodus_name(self) -> &'static str {
        match self {
            ElementShape::Bar2 => "BAR2",
            ElementShape::Bar3 => "BAR3",
            ElementShape::Tri3 => "TRI3",
            ElementShape::Tri6 => "TRI6",
            ElementShape::Quad4 => "QUAD4",
            ElementShape::Quad8 => "QUAD8",
            ElementShape::Quad9 => "QUAD9",
            ElementShape::Tet4 => "TETRA4",
            ElementShape::Tet10 => "TETRA10",
            ElementShape::Hex8 => "HEX8",
            ElementShape::Hex20 => "HEX20",
            ElementShape::Hex27 => "HEX27",
            ElementShape::Wedge6 => "WEDGE6",
        }
    }

    /// Number of nodes of one element of this shape.
    pub fn node_count(self) -> usize {
        match self {
            ElementShape::Bar2 => 2,
            ElementShape::Bar3 => 3,
            ElementShape::Tri3 => 3,
            ElementShape::Tri6 => 6,
            ElementShape::Quad4 => 4,
            ElementShape::Quad8 => 8,
            ElementShape::Quad9 => 9,
            ElementShape::Tet4 => 4,
            ElementShape::Tet10 => 10,
            ElementShape::Hex8 => 8,
            ElementShape::Hex20 => 20,
            ElementShape::Hex27 => 27,
            ElementShape::Wedge6 => 6,
        }
    }

    /// Topological dimension of the element.
    pub fn dimension(self) -> usize {
        match self {
            ElementShape::Bar2 | ElementShape::Bar3 => 1,
            ElementShape::Tri3
            | ElementShape::Tri6
            | ElementShape::Quad4
            | ElementShape::Quad8
            | ElementShape::Quad9 => 2,
            _ => 3,
        }
    }

    fn side_table(self) -> &'static [&'static [usize]] {
        match self {
            ElementShape::Bar2 | ElementShape::Bar3 => BAR2_SIDES,
            ElementShape::Tri3 => TRI3_SIDES,
            ElementShape::Tri6 => TRI6_SIDES,
            ElementShape::Quad4 => QUAD4_SIDES,
            // Quad9's centre node sits on no side.
            ElementShape::Quad8 | ElementShape::Quad9 => QUAD8_SIDES,
            ElementShape::Tet4 => TET4_SIDES,
            ElementShape::Tet10 => TET10_SIDES,
            ElementShape::Hex8 => HEX8_SIDES,
            ElementShape::Hex20 => HEX20_SIDES,
            ElementShape::Hex27 => HEX27_SIDES,
            ElementShape::Wedge6 => WEDGE6_SIDES,
        }
    }

    /// Number of sides.
    pub fn side_count(self) -> usize {
        self.side_table().len()
    }

    /// Local node indices of the 1-based `side`, or `None` if the shape has
    /// no such side.
    pub fn side_nodes(self, side: usize) -> Option<&'static [usize]> {
        side.checked_sub(1)
            .and_then(|s| self.side_table().get(s))
            .copied()
    }

    /// Nodes on the 1-based `side`; this is the side's distance-factor count.
    pub fn side_node_count(self, side: usize) -> Option<usize> {
        self.side_nodes(side).map(<[usize]>::len)
    }
}

impl fmt::Display for ElementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.exodus_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exodus_names() {
        assert_eq!(
            ElementShape::from_exodus_name("QUAD", 4),
            Some(ElementShape::Quad4)
        );
        assert_eq!(
            ElementShape::from_exodus_name("hex27", 27),
            Some(ElementShape::Hex27)
        );
        assert_eq!(
            ElementShape::from_exodus_name("TETRA", 10),
            Some(ElementShape::Tet10)
        );
        assert_eq!(ElementShape::from_exodus_name("QUAD", 5), None);
        assert_eq!(ElementShape::from_exodus_name("SPHERE", 1), None);
    }

    #[test]
    fn side_counts_match_face_sizes() {
        assert_eq!(ElementShape::Quad4.side_node_count(1), Some(2));
        assert_eq!(ElementShape::Quad9.side_node_count(4), Some(3));
        assert_eq!(ElementShape::Hex8.side_node_count(6), Some(4));
        assert_eq!(ElementShape::Hex20.side_node_count(2), Some(8));
        assert_eq!(ElementShape::Hex27.side_node_count(3), Some(9));
        assert_eq!(ElementShape::Wedge6.side_node_count(1), Some(4));
        assert_eq!(ElementShape::Wedge6.side_node_count(5), Some(3));
        assert_eq!(ElementShape::Tet10.side_node_count(4), Some(6));
        assert_eq!(ElementShape::Quad4.side_node_count(0), None);
        assert_eq!(ElementShape::Quad4.side_node_count(5), None);
    }

    #[test]
    fn side_nodes_stay_inside_element() {
        let all = [
            ElementShape::Bar2,
            ElementShape::Bar3,
            ElementShape::Tri3,
            ElementShape::Tri6,
            ElementShape::Quad4,
            ElementShape::Quad8,
            ElementShape::Quad9,
            ElementShape::Tet4,
            ElementShape::Tet10,
            ElementShape::Hex8,
            ElementShape::Hex20,
            ElementShape::Hex27,
            ElementShape::Wedge6,
        ];
        for shape in all {
            for side in 1..=shape.side_count() {
                let nodes = shape.side_nodes(side).unwrap();
                assert!(nodes.iter().all(|&n| n < shape.node_count()), "{shape} side {side}");
            }
        }
    }
}
