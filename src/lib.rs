//! # mesh-chain
//!
//! mesh-chain is a block-composable execution engine for geometry-processing
//! pipelines. Independent computational units ("blocks") declare typed
//! input/output connection points ("ports"), are wired together with explicit
//! directed connections ("pins"), and a coordinating chain derives a valid
//! execution order from the connection graph and runs each block exactly once
//! in that order.
//!
//! On top of the execution core sits a field-extraction subsystem that
//! transports per-element vector data (attached to mesh points, cells, or
//! interfaces) from one mesh onto a different, independently indexed mesh,
//! by identifier match, region-tag match, or spatial correspondence through
//! a bounding-volume tree.
//!
//! ## Determinism
//!
//! Chain execution is single-threaded and reproducible: ties between ready
//! blocks are broken by insertion order into the chain, so the execution
//! order is a pure function of the assembly code. All id-list queries on
//! meshes and fields return sorted vectors.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use mesh_chain::prelude::*;
//!
//! // A one-triangle mesh and a point field over it.
//! let mut mesh = MeshPatch::new();
//! mesh.add_vertex(ElementId::new(1), [0.0, 0.0, 0.0]).unwrap();
//! mesh.add_vertex(ElementId::new(2), [1.0, 0.0, 0.0]).unwrap();
//! mesh.add_vertex(ElementId::new(3), [0.0, 1.0, 0.0]).unwrap();
//! mesh.add_cell(
//!     ElementId::new(1),
//!     vec![ElementId::new(1), ElementId::new(2), ElementId::new(3)],
//!     0,
//! )
//! .unwrap();
//! let mesh = Arc::new(mesh);
//! let mut field = VectorField::on_geometry(&mesh, FieldLocation::Point);
//! field.insert(ElementId::new(1), [0.1, 0.0, 0.0]);
//!
//! // Assemble source -> extractor -> sink and run the chain.
//! let mut reg = BlockRegistry::new();
//! let geom = reg.add(Box::new(GeometrySource::with_geometry("geom", mesh)));
//! let fsrc = reg.add(Box::new(FieldSource::with_field("field", Arc::new(field))));
//! let extr = reg.add(Box::new(ExtractVectorField::new("extract", ExtractMode::Id)));
//! let sink = reg.add(Box::new(FieldSink::new("sink")));
//! reg.connect(geom, PortTag::Geometry, extr, PortTag::Geometry).unwrap();
//! reg.connect(fsrc, PortTag::VectorField, extr, PortTag::VectorField).unwrap();
//! reg.connect(extr, PortTag::VectorField, sink, PortTag::VectorField).unwrap();
//!
//! let mut chain = Chain::new();
//! for key in [geom, fsrc, extr, sink] {
//!     chain.add(key);
//! }
//! chain.execute(&mut reg, false).unwrap();
//! let sink = reg.downcast::<FieldSink>(sink).unwrap();
//! assert_eq!(sink.received().unwrap().len(), 1);
//! ```

pub mod blocks;
pub mod data;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod pipeline;
pub mod topology;

/// A convenient prelude importing the most-used traits & types.
pub mod prelude {
    pub use crate::blocks::{
        ApplyFieldTransform, ExtractVectorField, FieldSink, FieldSource, GeometrySink,
        GeometrySource, OverlapPolicy, ReconstructVectorField,
    };
    pub use crate::data::field::{FieldLocation, VectorField};
    pub use crate::error::ChainError;
    pub use crate::extract::{ExtractMode, ExtractionError, extract};
    pub use crate::geometry::bbox::Aabb;
    pub use crate::geometry::mesh::{Cell, Interface, MeshPatch};
    pub use crate::geometry::skd_tree::{SkdTree, select_by_patch};
    pub use crate::pipeline::block::{Block, BlockKey, ExecState, PortIo};
    pub use crate::pipeline::chain::Chain;
    pub use crate::pipeline::port::{PayloadKind, PortPayload, PortSpec, PortTag};
    pub use crate::pipeline::registry::BlockRegistry;
    pub use crate::pipeline::trace::{ChainTracer, LogTracer};
    pub use crate::topology::element::ElementId;
}
