//! Mesh geometry: patches, bounding boxes, and the cell spatial index.

pub mod bbox;
pub mod mesh;
pub mod skd_tree;

pub use bbox::Aabb;
pub use mesh::{Cell, Interface, MeshPatch};
pub use skd_tree::{SkdTree, select_by_patch};
