//! The block capability: a unit of computation exposing named ports.
//!
//! Blocks never reference each other; all communication goes through ports
//! and pins, which is what lets a chain reorder them safely. Concrete
//! variants (sources, sinks, extractors, combiners, transforms) live in
//! [`crate::blocks`].

use hashbrown::HashMap;

use crate::error::BlockError;
use crate::pipeline::port::{Direction, PortPayload, PortSpec, PortTag};

/// Index handle into a [`crate::pipeline::registry::BlockRegistry`].
///
/// Handles are stable for the registry's lifetime; blocks are never removed,
/// so a key can always be resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey(pub(crate) usize);

impl BlockKey {
    /// Raw index, for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Execution state of a block, driven by the chain.
///
/// `NotRun → Ready → Running → Done`, with `Failed` absorbing from `Running`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ExecState {
    #[default]
    NotRun,
    Ready,
    Running,
    Done,
    Failed,
}

/// Port values visible to one block invocation: bound inputs in, produced
/// outputs out.
#[derive(Debug, Default)]
pub struct PortIo {
    inputs: HashMap<PortTag, Vec<PortPayload>>,
    outputs: HashMap<PortTag, PortPayload>,
}

impl PortIo {
    pub(crate) fn with_inputs(inputs: HashMap<PortTag, Vec<PortPayload>>) -> Self {
        PortIo {
            inputs,
            outputs: HashMap::new(),
        }
    }

    /// First value bound to the input port, if any.
    pub fn input(&self, tag: PortTag) -> Option<&PortPayload> {
        self.inputs.get(&tag).and_then(|v| v.first())
    }

    /// All values bound to a (possibly multi-valued) input port.
    pub fn inputs(&self, tag: PortTag) -> &[PortPayload] {
        self.inputs.get(&tag).map_or(&[], |v| v.as_slice())
    }

    /// Convenience: the input as a geometry, if bound and of that kind.
    pub fn input_geometry(
        &self,
        tag: PortTag,
    ) -> Option<std::sync::Arc<crate::geometry::mesh::MeshPatch>> {
        self.input(tag).and_then(|p| p.as_geometry()).cloned()
    }

    /// Convenience: the input as a field, if bound and of that kind.
    pub fn input_field(
        &self,
        tag: PortTag,
    ) -> Option<std::sync::Arc<crate::data::field::VectorField>> {
        self.input(tag).and_then(|p| p.as_field()).cloned()
    }

    /// Writes an output value; replaces any value written earlier this run.
    pub fn set_output(&mut self, tag: PortTag, payload: PortPayload) {
        self.outputs.insert(tag, payload);
    }

    pub(crate) fn take_outputs(&mut self) -> HashMap<PortTag, PortPayload> {
        std::mem::take(&mut self.outputs)
    }

    /// One-line summary of bound inputs, for tracing.
    pub fn describe_inputs(&self) -> String {
        describe(self.inputs.iter().flat_map(|(tag, vs)| {
            vs.iter().map(move |v| (*tag, v))
        }))
    }

    /// One-line summary of produced outputs, for tracing.
    pub fn describe_outputs(&self) -> String {
        describe(self.outputs.iter().map(|(tag, v)| (*tag, v)))
    }
}

fn describe<'a, I>(values: I) -> String
where
    I: Iterator<Item = (PortTag, &'a PortPayload)>,
{
    let mut parts: Vec<String> = values
        .map(|(tag, v)| format!("{tag:?}={}", v.summary()))
        .collect();
    parts.sort_unstable();
    if parts.is_empty() {
        "(none)".to_string()
    } else {
        parts.join(", ")
    }
}

/// A unit of computation with a fixed set of typed ports.
pub trait Block {
    /// Human-readable block name, used in errors and traces.
    fn name(&self) -> &str;

    /// The block's port declarations; fixed at construction.
    fn ports(&self) -> &[PortSpec];

    /// Reads input-port values, computes, writes output-port values.
    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError>;

    /// Concrete-type access, so callers can inspect a block (e.g. a sink's
    /// retained value) after execution.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Finds a port declaration by tag and direction.
pub fn find_port(specs: &[PortSpec], tag: PortTag, direction: Direction) -> Option<&PortSpec> {
    specs
        .iter()
        .find(|s| s.tag == tag && s.direction == direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::{FieldLocation, VectorField};
    use std::sync::Arc;

    #[test]
    fn io_inputs_and_outputs() {
        let mut inputs = HashMap::new();
        let f = Arc::new(VectorField::new(FieldLocation::Cell));
        inputs.insert(PortTag::VectorField, vec![PortPayload::Field(f.clone())]);
        let mut io = PortIo::with_inputs(inputs);

        assert!(io.input(PortTag::VectorField).is_some());
        assert!(io.input(PortTag::Geometry).is_none());
        assert_eq!(io.inputs(PortTag::VectorField).len(), 1);
        assert!(io.inputs(PortTag::Geometry).is_empty());
        assert!(io.input_field(PortTag::VectorField).is_some());
        assert!(io.input_geometry(PortTag::VectorField).is_none());

        io.set_output(PortTag::VectorField, PortPayload::Field(f));
        assert_eq!(io.take_outputs().len(), 1);
        assert!(io.take_outputs().is_empty());
    }

    #[test]
    fn describe_is_stable() {
        let io = PortIo::default();
        assert_eq!(io.describe_inputs(), "(none)");
    }

    #[test]
    fn find_port_by_tag_and_direction() {
        let specs = [
            PortSpec::input(PortTag::Geometry),
            PortSpec::output(PortTag::VectorField),
        ];
        assert!(find_port(&specs, PortTag::Geometry, Direction::Input).is_some());
        assert!(find_port(&specs, PortTag::Geometry, Direction::Output).is_none());
        assert!(find_port(&specs, PortTag::VectorField, Direction::Output).is_some());
    }
}
