//! Element identifiers and topology-level primitives.

pub mod element;

pub use element::ElementId;
