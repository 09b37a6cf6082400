//! Block registry: index-handled block storage, pins, and produced values.
//!
//! The registry owns every block behind a [`BlockKey`] handle, owns all pins
//! between them, and retains the outputs blocks produce. Outputs persist
//! across chain executions, so a pin whose source belongs to an earlier,
//! already-executed chain still satisfies its target's input in a later
//! chain.
//!
//! `connect` is the sole way blocks come to reference each other, and it
//! enforces the wiring contract: matching payload kinds, correct directions,
//! and input arity.

use hashbrown::HashMap;

use crate::error::ChainError;
use crate::pipeline::block::{Block, BlockKey, ExecState, find_port};
use crate::pipeline::port::{Direction, PortPayload, PortTag};

/// A directed, type-checked edge from an output port to an input port.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pin {
    pub source: BlockKey,
    pub source_tag: PortTag,
    pub target: BlockKey,
    pub target_tag: PortTag,
}

struct Registered {
    block: Box<dyn Block>,
    state: ExecState,
}

/// Owner of blocks, pins, and produced port values.
#[derive(Default)]
pub struct BlockRegistry {
    blocks: Vec<Registered>,
    pins: Vec<Pin>,
    outputs: HashMap<(BlockKey, PortTag), PortPayload>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a block, returning its handle.
    pub fn add(&mut self, block: Box<dyn Block>) -> BlockKey {
        self.blocks.push(Registered {
            block,
            state: ExecState::NotRun,
        });
        BlockKey(self.blocks.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, key: BlockKey) -> Result<&dyn Block, ChainError> {
        self.blocks
            .get(key.0)
            .map(|r| r.block.as_ref())
            .ok_or(ChainError::UnknownBlock(key))
    }

    pub fn block_mut(&mut self, key: BlockKey) -> Result<&mut dyn Block, ChainError> {
        match self.blocks.get_mut(key.0) {
            Some(r) => Ok(r.block.as_mut()),
            None => Err(ChainError::UnknownBlock(key)),
        }
    }

    /// The block's human-readable name.
    pub fn name(&self, key: BlockKey) -> Result<&str, ChainError> {
        self.block(key).map(|b| b.name())
    }

    /// Downcasts a registered block to its concrete type, for inspecting
    /// results it retained (e.g. a sink's received value).
    pub fn downcast<T: 'static>(&self, key: BlockKey) -> Option<&T> {
        self.blocks
            .get(key.0)
            .and_then(|r| r.block.as_any().downcast_ref::<T>())
    }

    /// Current execution state of a block (`NotRun` for unknown keys is not
    /// forgiven; the key must be valid).
    pub fn state(&self, key: BlockKey) -> Result<ExecState, ChainError> {
        self.blocks
            .get(key.0)
            .map(|r| r.state)
            .ok_or(ChainError::UnknownBlock(key))
    }

    pub(crate) fn set_state(&mut self, key: BlockKey, state: ExecState) {
        if let Some(r) = self.blocks.get_mut(key.0) {
            r.state = state;
        }
    }

    /// Establishes a pin from `source`'s output port to `target`'s input port.
    pub fn connect(
        &mut self,
        source: BlockKey,
        source_tag: PortTag,
        target: BlockKey,
        target_tag: PortTag,
    ) -> Result<(), ChainError> {
        let src_name = self.name(source)?.to_string();
        let dst_name = self.name(target)?.to_string();
        if source == target {
            return Err(ChainError::SelfConnection(src_name));
        }
        let src_spec = find_port(self.block(source)?.ports(), source_tag, Direction::Output)
            .copied()
            .ok_or(ChainError::UnknownPort {
                block: src_name.clone(),
                direction: "output",
                tag: source_tag,
            })?;
        let dst_spec = find_port(self.block(target)?.ports(), target_tag, Direction::Input)
            .copied()
            .ok_or(ChainError::UnknownPort {
                block: dst_name.clone(),
                direction: "input",
                tag: target_tag,
            })?;
        if src_spec.tag.payload_kind() != dst_spec.tag.payload_kind() {
            return Err(ChainError::TypeMismatch {
                source_tag,
                source_kind: src_spec.tag.payload_kind(),
                target: target_tag,
                target_kind: dst_spec.tag.payload_kind(),
            });
        }
        if !dst_spec.multi
            && self
                .pins
                .iter()
                .any(|p| p.target == target && p.target_tag == target_tag)
        {
            return Err(ChainError::ArityViolation {
                block: dst_name,
                tag: target_tag,
            });
        }
        self.pins.push(Pin {
            source,
            source_tag,
            target,
            target_tag,
        });
        Ok(())
    }

    /// Removes the pin established by the matching `connect`.
    pub fn disconnect(
        &mut self,
        source: BlockKey,
        source_tag: PortTag,
        target: BlockKey,
        target_tag: PortTag,
    ) -> Result<(), ChainError> {
        let wanted = Pin {
            source,
            source_tag,
            target,
            target_tag,
        };
        match self.pins.iter().position(|p| *p == wanted) {
            Some(idx) => {
                self.pins.remove(idx);
                Ok(())
            }
            None => Err(ChainError::NoSuchPin {
                src: self.name(source)?.to_string(),
                src_tag: source_tag,
                dst: self.name(target)?.to_string(),
                dst_tag: target_tag,
            }),
        }
    }

    /// All registered pins, in creation order.
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Pins feeding the given block.
    pub fn pins_into(&self, key: BlockKey) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(move |p| p.target == key)
    }

    /// Pins leaving the given block.
    pub fn pins_from(&self, key: BlockKey) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(move |p| p.source == key)
    }

    /// The value last produced on a block's output port, if any.
    pub fn output(&self, key: BlockKey, tag: PortTag) -> Option<&PortPayload> {
        self.outputs.get(&(key, tag))
    }

    pub(crate) fn record_outputs(
        &mut self,
        key: BlockKey,
        outputs: HashMap<PortTag, PortPayload>,
    ) {
        for (tag, value) in outputs {
            self.outputs.insert((key, tag), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::io::{FieldSink, GeometrySource};
    use crate::blocks::reconstruct::{OverlapPolicy, ReconstructVectorField};
    use crate::blocks::transform::ApplyFieldTransform;

    fn registry() -> (BlockRegistry, BlockKey, BlockKey, BlockKey) {
        let mut reg = BlockRegistry::new();
        let src = reg.add(Box::new(GeometrySource::new("src")));
        let xf = reg.add(Box::new(ApplyFieldTransform::new("xf", |v| v)));
        let sink = reg.add(Box::new(FieldSink::new("sink")));
        (reg, src, xf, sink)
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let (mut reg, src, xf, _) = registry();
        // geometry output into a field input
        let err = reg
            .connect(src, PortTag::Geometry, xf, PortTag::VectorField)
            .unwrap_err();
        assert!(matches!(err, ChainError::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_port_is_rejected() {
        let (mut reg, src, _, sink) = registry();
        let err = reg
            .connect(src, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::UnknownPort { direction: "output", .. }
        ));
        let err = reg
            .connect(src, PortTag::Geometry, sink, PortTag::Geometry)
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::UnknownPort { direction: "input", .. }
        ));
    }

    #[test]
    fn arity_violation_on_single_input() {
        let (mut reg, _, xf, sink) = registry();
        let xf2 = reg.add(Box::new(ApplyFieldTransform::new("xf2", |v| v)));
        reg.connect(xf, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap();
        let err = reg
            .connect(xf2, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap_err();
        assert!(matches!(err, ChainError::ArityViolation { .. }));
    }

    #[test]
    fn multi_input_accepts_fan_in() {
        let mut reg = BlockRegistry::new();
        let a = reg.add(Box::new(ApplyFieldTransform::new("a", |v| v)));
        let b = reg.add(Box::new(ApplyFieldTransform::new("b", |v| v)));
        let recon = reg.add(Box::new(ReconstructVectorField::new(
            "recon",
            OverlapPolicy::Sum,
        )));
        reg.connect(a, PortTag::VectorField, recon, PortTag::VectorField)
            .unwrap();
        reg.connect(b, PortTag::VectorField, recon, PortTag::VectorField)
            .unwrap();
        assert_eq!(reg.pins_into(recon).count(), 2);
    }

    #[test]
    fn disconnect_frees_the_slot() {
        let (mut reg, _, xf, sink) = registry();
        reg.connect(xf, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap();
        reg.disconnect(xf, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap();
        // slot is free again
        reg.connect(xf, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap();
        // a second disconnect of a now-unique pin works, a third fails
        reg.disconnect(xf, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap();
        let err = reg
            .disconnect(xf, PortTag::VectorField, sink, PortTag::VectorField)
            .unwrap_err();
        assert!(matches!(err, ChainError::NoSuchPin { .. }));
    }

    #[test]
    fn self_connection_is_rejected() {
        let mut reg = BlockRegistry::new();
        let xf = reg.add(Box::new(ApplyFieldTransform::new("xf", |v| v)));
        let err = reg
            .connect(xf, PortTag::VectorField, xf, PortTag::VectorField)
            .unwrap_err();
        assert!(matches!(err, ChainError::SelfConnection(_)));
    }
}
