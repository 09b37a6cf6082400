//! Source and sink blocks.
//!
//! Sources stand in for the out-of-scope file readers: they are seeded
//! programmatically and publish their payload on an output port. Sinks
//! retain the value they receive so the assembling code can inspect it
//! after the chain has run.

use std::any::Any;
use std::sync::Arc;

use crate::blocks::BlockOpError;
use crate::data::field::{FieldLocation, VectorField};
use crate::error::BlockError;
use crate::geometry::mesh::MeshPatch;
use crate::pipeline::block::{Block, PortIo};
use crate::pipeline::port::{Direction, PortPayload, PortSpec, PortTag};

const GEOM_SOURCE_PORTS: &[PortSpec] = &[PortSpec {
    tag: PortTag::Geometry,
    direction: Direction::Output,
    multi: true,
    mandatory: false,
}];

const FIELD_SOURCE_PORTS: &[PortSpec] = &[PortSpec {
    tag: PortTag::VectorField,
    direction: Direction::Output,
    multi: true,
    mandatory: false,
}];

const GEOM_SINK_PORTS: &[PortSpec] = &[PortSpec {
    tag: PortTag::Geometry,
    direction: Direction::Input,
    multi: false,
    mandatory: true,
}];

const FIELD_SINK_PORTS: &[PortSpec] = &[PortSpec {
    tag: PortTag::VectorField,
    direction: Direction::Input,
    multi: false,
    mandatory: true,
}];

/// Publishes a programmatically seeded geometry on a `Geometry` output.
pub struct GeometrySource {
    name: String,
    geometry: Option<Arc<MeshPatch>>,
}

impl GeometrySource {
    /// Unseeded source; executing it before [`set_geometry`](Self::set_geometry)
    /// fails the block.
    pub fn new(name: impl Into<String>) -> Self {
        GeometrySource {
            name: name.into(),
            geometry: None,
        }
    }

    pub fn with_geometry(name: impl Into<String>, geometry: Arc<MeshPatch>) -> Self {
        GeometrySource {
            name: name.into(),
            geometry: Some(geometry),
        }
    }

    pub fn set_geometry(&mut self, geometry: Arc<MeshPatch>) {
        self.geometry = Some(geometry);
    }
}

impl Block for GeometrySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortSpec] {
        GEOM_SOURCE_PORTS
    }

    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError> {
        let geometry = self
            .geometry
            .clone()
            .ok_or_else(|| BlockOpError::NoData(self.name.clone()))?;
        io.set_output(PortTag::Geometry, PortPayload::Geometry(geometry));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Publishes a programmatically seeded field on a `VectorField` output.
pub struct FieldSource {
    name: String,
    field: Option<Arc<VectorField>>,
}

impl FieldSource {
    pub fn new(name: impl Into<String>) -> Self {
        FieldSource {
            name: name.into(),
            field: None,
        }
    }

    pub fn with_field(name: impl Into<String>, field: Arc<VectorField>) -> Self {
        FieldSource {
            name: name.into(),
            field: Some(field),
        }
    }

    pub fn set_field(&mut self, field: Arc<VectorField>) {
        self.field = Some(field);
    }
}

impl Block for FieldSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortSpec] {
        FIELD_SOURCE_PORTS
    }

    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError> {
        let field = self
            .field
            .clone()
            .ok_or_else(|| BlockOpError::NoData(self.name.clone()))?;
        io.set_output(PortTag::VectorField, PortPayload::Field(field));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Retains the geometry it receives.
pub struct GeometrySink {
    name: String,
    received: Option<Arc<MeshPatch>>,
}

impl GeometrySink {
    pub fn new(name: impl Into<String>) -> Self {
        GeometrySink {
            name: name.into(),
            received: None,
        }
    }

    /// The geometry received during the last execution, if any.
    pub fn received(&self) -> Option<&Arc<MeshPatch>> {
        self.received.as_ref()
    }
}

impl Block for GeometrySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortSpec] {
        GEOM_SINK_PORTS
    }

    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError> {
        self.received = Some(io.input_geometry(PortTag::Geometry).ok_or_else(|| {
            BlockOpError::WrongPayload {
                block: self.name.clone(),
                tag: PortTag::Geometry,
            }
        })?);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Retains the field it receives; optionally builds a dense, zero-filled
/// presentation of it over the field's geometry.
///
/// The dense form is a plotting convenience only: missing values become
/// zero in the presentation, never in the retained field itself. Interface-
/// and undefined-located data have no dense form and fail the block when a
/// presentation is requested.
pub struct FieldSink {
    name: String,
    zero_fill: bool,
    received: Option<Arc<VectorField>>,
    presented: Option<Vec<[f64; 3]>>,
}

impl FieldSink {
    pub fn new(name: impl Into<String>) -> Self {
        FieldSink {
            name: name.into(),
            zero_fill: false,
            received: None,
            presented: None,
        }
    }

    /// Enables the dense zero-filled presentation.
    pub fn with_zero_fill(name: impl Into<String>) -> Self {
        FieldSink {
            zero_fill: true,
            ..Self::new(name)
        }
    }

    /// The field received during the last execution, if any.
    pub fn received(&self) -> Option<&Arc<VectorField>> {
        self.received.as_ref()
    }

    /// The dense presentation built during the last execution, if any.
    pub fn presented(&self) -> Option<&[[f64; 3]]> {
        self.presented.as_deref()
    }
}

impl Block for FieldSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortSpec] {
        FIELD_SINK_PORTS
    }

    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError> {
        let field = io.input_field(PortTag::VectorField).ok_or_else(|| {
            BlockOpError::WrongPayload {
                block: self.name.clone(),
                tag: PortTag::VectorField,
            }
        })?;
        self.received = Some(field.clone());
        self.presented = None;
        if self.zero_fill {
            match field.location() {
                FieldLocation::Interface | FieldLocation::Undefined => {
                    return Err(BlockOpError::UnpresentableLocation(
                        self.name.clone(),
                        field.location(),
                    )
                    .into());
                }
                FieldLocation::Point | FieldLocation::Cell => {}
            }
            // No geometry to fill against: skip the presentation quietly.
            if field.geometry().is_some() {
                let mut dense = (*field).clone();
                dense.complete_missing_data([0.0, 0.0, 0.0]);
                self.presented = Some(dense.as_dense_vec());
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::ElementId;
    use hashbrown::HashMap;

    fn id(raw: u64) -> ElementId {
        ElementId::new(raw)
    }

    fn mesh() -> Arc<MeshPatch> {
        let mut m = MeshPatch::new();
        m.add_vertex(id(1), [0.0, 0.0, 0.0]).unwrap();
        m.add_vertex(id(2), [1.0, 0.0, 0.0]).unwrap();
        m.add_vertex(id(3), [0.0, 1.0, 0.0]).unwrap();
        m.add_cell(id(1), vec![id(1), id(2), id(3)], 0).unwrap();
        Arc::new(m)
    }

    fn io_with_field(field: Arc<VectorField>) -> PortIo {
        let mut inputs = HashMap::new();
        inputs.insert(PortTag::VectorField, vec![PortPayload::Field(field)]);
        PortIo::with_inputs(inputs)
    }

    #[test]
    fn unseeded_source_fails() {
        let mut src = GeometrySource::new("src");
        let mut io = PortIo::default();
        assert!(src.execute(&mut io).is_err());
        src.set_geometry(mesh());
        assert!(src.execute(&mut io).is_ok());
    }

    #[test]
    fn field_sink_retains_value() {
        let geom = mesh();
        let mut f = VectorField::on_geometry(&geom, FieldLocation::Point);
        f.insert(id(1), [1.0, 0.0, 0.0]);
        let mut sink = FieldSink::new("sink");
        sink.execute(&mut io_with_field(Arc::new(f))).unwrap();
        assert_eq!(sink.received().unwrap().len(), 1);
        assert!(sink.presented().is_none());
    }

    #[test]
    fn zero_fill_builds_dense_presentation() {
        let geom = mesh();
        let mut f = VectorField::on_geometry(&geom, FieldLocation::Point);
        f.insert(id(2), [5.0, 0.0, 0.0]);
        let mut sink = FieldSink::with_zero_fill("sink");
        sink.execute(&mut io_with_field(Arc::new(f))).unwrap();
        let dense = sink.presented().unwrap();
        assert_eq!(dense.len(), 3);
        assert_eq!(dense[0], [0.0, 0.0, 0.0]); // vertex 1, zero-filled
        assert_eq!(dense[1], [5.0, 0.0, 0.0]); // vertex 2
        // retained field is untouched by the fill
        assert_eq!(sink.received().unwrap().len(), 1);
    }

    #[test]
    fn zero_fill_refuses_interface_location() {
        let geom = mesh();
        let mut f = VectorField::on_geometry(&geom, FieldLocation::Interface);
        f.insert(id(1), [0.0; 3]);
        let mut sink = FieldSink::with_zero_fill("sink");
        assert!(sink.execute(&mut io_with_field(Arc::new(f))).is_err());
    }
}
