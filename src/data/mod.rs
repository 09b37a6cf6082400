//! Per-element field data containers.

pub mod field;

pub use field::{FieldLocation, VectorField};
