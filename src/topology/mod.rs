//! Top-level module for the global mesh description.
//!
//! This module provides the input side of a decomposition:
//! - [`ElementShape`], the element-shape lookup (node counts, Exodus side tables)
//! - [`Mesh`] with its element blocks, node-sets and side-sets
//!
//! A [`Mesh`] is validated on construction and read-only afterwards.

pub mod cell_type;
pub mod mesh;

pub use cell_type::ElementShape;
pub use mesh::{ElementBlock, Mesh, NodeSet, SideSet};
