//! Generic per-value field transform block.

use std::any::Any;
use std::sync::Arc;

use crate::blocks::BlockOpError;
use crate::data::field::VectorField;
use crate::error::BlockError;
use crate::pipeline::block::{Block, PortIo};
use crate::pipeline::port::{Direction, PortPayload, PortSpec, PortTag};

const PORTS: &[PortSpec] = &[
    PortSpec {
        tag: PortTag::VectorField,
        direction: Direction::Input,
        multi: false,
        mandatory: true,
    },
    PortSpec {
        tag: PortTag::VectorField,
        direction: Direction::Output,
        multi: true,
        mandatory: false,
    },
];

/// Applies a caller-supplied function to every value of the input field.
///
/// Identifiers, location, and the geometry reference pass through unchanged.
pub struct ApplyFieldTransform {
    name: String,
    func: Box<dyn FnMut([f64; 3]) -> [f64; 3] + Send>,
}

impl ApplyFieldTransform {
    pub fn new(
        name: impl Into<String>,
        func: impl FnMut([f64; 3]) -> [f64; 3] + Send + 'static,
    ) -> Self {
        ApplyFieldTransform {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl Block for ApplyFieldTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortSpec] {
        PORTS
    }

    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError> {
        let field = io.input_field(PortTag::VectorField).ok_or_else(|| {
            BlockOpError::WrongPayload {
                block: self.name.clone(),
                tag: PortTag::VectorField,
            }
        })?;
        let mut out = VectorField::new(field.location());
        if let Some(geom) = field.geometry() {
            out.set_geometry(&geom);
        }
        for (id, value) in field.iter() {
            out.insert(id, (self.func)(value));
        }
        io.set_output(PortTag::VectorField, PortPayload::Field(Arc::new(out)));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
