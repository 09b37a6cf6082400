//! Field extraction block.
//!
//! Wraps the [`crate::extract`] engine as a chain block: the target geometry
//! and the source field arrive on input pins, the extracted field leaves on
//! an output pin. Extraction failures (incoherent field, empty result, dead
//! geometry reference) fail the block and therefore abort the chain.

use std::any::Any;
use std::sync::Arc;

use crate::blocks::BlockOpError;
use crate::data::field::FieldLocation;
use crate::error::BlockError;
use crate::extract::{ExtractMode, extract};
use crate::pipeline::block::{Block, PortIo};
use crate::pipeline::port::{Direction, PortPayload, PortSpec, PortTag};

const PORTS: &[PortSpec] = &[
    PortSpec {
        tag: PortTag::Geometry,
        direction: Direction::Input,
        multi: false,
        mandatory: true,
    },
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

/// Extracts the input field onto the input (target) geometry.
pub struct ExtractVectorField {
    name: String,
    mode: ExtractMode,
    /// Overrides the extraction location; defaults to the input field's
    /// effective location (`Undefined` read as `Point`).
    location: Option<FieldLocation>,
    tolerance: f64,
}

impl ExtractVectorField {
    pub fn new(name: impl Into<String>, mode: ExtractMode) -> Self {
        ExtractVectorField {
            name: name.into(),
            mode,
            location: None,
            tolerance: 1.0e-8,
        }
    }

    /// Sets the element location of the extraction.
    pub fn with_location(mut self, location: FieldLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the mapping tolerance (absolute, in mesh coordinate units).
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn mode(&self) -> ExtractMode {
        self.mode
    }
}

impl Block for ExtractVectorField {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortSpec] {
        PORTS
    }

    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError> {
        let target = io.input_geometry(PortTag::Geometry).ok_or_else(|| {
            BlockOpError::WrongPayload {
                block: self.name.clone(),
                tag: PortTag::Geometry,
            }
        })?;
        let field = io.input_field(PortTag::VectorField).ok_or_else(|| {
            BlockOpError::WrongPayload {
                block: self.name.clone(),
                tag: PortTag::VectorField,
            }
        })?;
        let location = self
            .location
            .unwrap_or_else(|| field.location().or_point());
        let result = extract(&field, &target, self.mode, location, self.tolerance).map_err(
            |source| BlockOpError::Extraction {
                block: self.name.clone(),
                source,
            },
        )?;
        io.set_output(PortTag::VectorField, PortPayload::Field(Arc::new(result)));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
