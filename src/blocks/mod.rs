//! Concrete block variants: sources, sinks, extraction, reconstruction,
//! and generic field transforms.

pub mod extract;
pub mod io;
pub mod reconstruct;
pub mod transform;

use thiserror::Error;

use crate::data::field::FieldLocation;
use crate::extract::ExtractionError;

pub use extract::ExtractVectorField;
pub use io::{FieldSink, FieldSource, GeometrySink, GeometrySource};
pub use reconstruct::{OverlapPolicy, ReconstructVectorField};
pub use transform::ApplyFieldTransform;

/// Domain failures reported by the built-in blocks.
#[derive(Debug, Error)]
pub enum BlockOpError {
    /// A source block was executed before being seeded with data.
    #[error("block `{0}`: no data loaded")]
    NoData(String),
    /// An input payload had an unexpected kind for the port.
    #[error("block `{block}`: input on {tag:?} has the wrong payload kind")]
    WrongPayload {
        block: String,
        tag: crate::pipeline::port::PortTag,
    },
    /// Fields being combined disagree on their data location.
    #[error("block `{0}`: input fields have mismatched locations")]
    LocationMismatch(String),
    /// Interface- or undefined-located data cannot be presented densely.
    #[error("block `{0}`: cannot present {1:?}-located data")]
    UnpresentableLocation(String, FieldLocation),
    /// The extraction engine reported a failure.
    #[error("block `{block}`: extraction failed")]
    Extraction {
        block: String,
        #[source]
        source: ExtractionError,
    },
}
