//! Typed ports and the payloads that flow through them.
//!
//! Ports are named connection slots on blocks. A [`PortTag`] is a small,
//! stable symbolic identifier shared by convention across blocks; every tag
//! maps to exactly one [`PayloadKind`], and two ports are wire-compatible
//! iff their kinds agree. This is what allows, e.g., a `Geometry` output to
//! drive a `TargetGeometry` input.

use std::sync::Arc;

use crate::data::field::VectorField;
use crate::geometry::mesh::MeshPatch;

/// Symbolic slot identifiers shared by convention across blocks.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum PortTag {
    /// A mesh geometry.
    Geometry,
    /// A second geometry slot, used when a block consumes two meshes.
    TargetGeometry,
    /// A per-element vector field.
    VectorField,
    /// A vector field interpreted as displacements.
    Displacements,
}

/// The payload type carried by a port.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Geometry,
    VectorField,
}

impl PortTag {
    /// The payload kind this tag carries.
    pub fn payload_kind(self) -> PayloadKind {
        match self {
            PortTag::Geometry | PortTag::TargetGeometry => PayloadKind::Geometry,
            PortTag::VectorField | PortTag::Displacements => PayloadKind::VectorField,
        }
    }
}

/// Direction of a port relative to its block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Declaration of one connection slot; immutable once a block is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PortSpec {
    pub tag: PortTag,
    pub direction: Direction,
    /// Whether the port accepts more than one incoming pin.
    pub multi: bool,
    /// Whether execution requires a produced value on this port.
    pub mandatory: bool,
}

impl PortSpec {
    /// Mandatory, single-valued input.
    pub fn input(tag: PortTag) -> Self {
        PortSpec {
            tag,
            direction: Direction::Input,
            multi: false,
            mandatory: true,
        }
    }

    /// Optional, single-valued input.
    pub fn optional_input(tag: PortTag) -> Self {
        PortSpec {
            mandatory: false,
            ..Self::input(tag)
        }
    }

    /// Mandatory input accepting fan-in from several pins.
    pub fn multi_input(tag: PortTag) -> Self {
        PortSpec {
            multi: true,
            ..Self::input(tag)
        }
    }

    /// Output port (fan-out is always allowed on outputs).
    pub fn output(tag: PortTag) -> Self {
        PortSpec {
            tag,
            direction: Direction::Output,
            multi: true,
            mandatory: false,
        }
    }
}

/// A value travelling over a pin. Cheap to clone for fan-out broadcast.
#[derive(Clone, Debug)]
pub enum PortPayload {
    Geometry(Arc<MeshPatch>),
    Field(Arc<VectorField>),
}

impl PortPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            PortPayload::Geometry(_) => PayloadKind::Geometry,
            PortPayload::Field(_) => PayloadKind::VectorField,
        }
    }

    pub fn as_geometry(&self) -> Option<&Arc<MeshPatch>> {
        match self {
            PortPayload::Geometry(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&Arc<VectorField>> {
        match self {
            PortPayload::Field(f) => Some(f),
            _ => None,
        }
    }

    /// One-line description for tracing output.
    pub fn summary(&self) -> String {
        match self {
            PortPayload::Geometry(g) => format!(
                "geometry({} vertices, {} cells)",
                g.vertex_count(),
                g.cell_count()
            ),
            PortPayload::Field(f) => {
                format!("field({:?}, {} values)", f.location(), f.len())
            }
        }
    }
}
