//! Field reconstruction: merge several fields into one.
//!
//! Used when independent upstream branches each produce a partial field
//! over (parts of) the same geometry and a downstream consumer needs a
//! single field. Where branches overlap on an element id, the configured
//! [`OverlapPolicy`] decides the merged value.

use std::any::Any;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::blocks::BlockOpError;
use crate::data::field::VectorField;
use crate::error::BlockError;
use crate::pipeline::block::{Block, PortIo};
use crate::pipeline::port::{Direction, PortPayload, PortSpec, PortTag};
use crate::topology::element::ElementId;

const PORTS: &[PortSpec] = &[
    PortSpec {
        tag: PortTag::VectorField,
        direction: Direction::Input,
        multi: true,
        mandatory: true,
    },
    PortSpec {
        tag: PortTag::VectorField,
        direction: Direction::Output,
        multi: true,
        mandatory: false,
    },
];

/// How overlapping element values combine during reconstruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Keep the value from the first input carrying the id.
    First,
    /// Keep the value from the last input carrying the id.
    Last,
    /// Component-wise sum over all inputs carrying the id.
    Sum,
    /// Component-wise average over all inputs carrying the id.
    Average,
}

/// Merges the fields arriving on its multi-valued input into one field.
pub struct ReconstructVectorField {
    name: String,
    policy: OverlapPolicy,
}

impl ReconstructVectorField {
    pub fn new(name: impl Into<String>, policy: OverlapPolicy) -> Self {
        ReconstructVectorField {
            name: name.into(),
            policy,
        }
    }
}

impl Block for ReconstructVectorField {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortSpec] {
        PORTS
    }

    fn execute(&mut self, io: &mut PortIo) -> Result<(), BlockError> {
        let fields: Vec<Arc<VectorField>> = io
            .inputs(PortTag::VectorField)
            .iter()
            .filter_map(|p| p.as_field())
            .cloned()
            .collect();
        let Some(first) = fields.first() else {
            return Err(BlockOpError::WrongPayload {
                block: self.name.clone(),
                tag: PortTag::VectorField,
            }
            .into());
        };
        let location = first.location().or_point();
        if fields
            .iter()
            .any(|f| f.location().or_point() != location)
        {
            return Err(BlockOpError::LocationMismatch(self.name.clone()).into());
        }

        let mut acc: HashMap<ElementId, ([f64; 3], usize)> = HashMap::new();
        for field in &fields {
            for (id, value) in field.iter() {
                match self.policy {
                    OverlapPolicy::First => {
                        acc.entry(id).or_insert((value, 1));
                    }
                    OverlapPolicy::Last => {
                        acc.insert(id, (value, 1));
                    }
                    OverlapPolicy::Sum | OverlapPolicy::Average => {
                        let entry = acc.entry(id).or_insert(([0.0; 3], 0));
                        for k in 0..3 {
                            entry.0[k] += value[k];
                        }
                        entry.1 += 1;
                    }
                }
            }
        }

        let mut out = VectorField::new(first.location());
        if let Some(geom) = first.geometry() {
            out.set_geometry(&geom);
        }
        for (id, (mut value, count)) in acc {
            if self.policy == OverlapPolicy::Average && count > 1 {
                for component in &mut value {
                    *component /= count as f64;
                }
            }
            out.insert(id, value);
        }
        io.set_output(PortTag::VectorField, PortPayload::Field(Arc::new(out)));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::FieldLocation;

    fn id(raw: u64) -> ElementId {
        ElementId::new(raw)
    }

    fn io_with(fields: Vec<VectorField>) -> PortIo {
        let mut inputs = HashMap::new();
        inputs.insert(
            PortTag::VectorField,
            fields
                .into_iter()
                .map(|f| PortPayload::Field(Arc::new(f)))
                .collect(),
        );
        PortIo::with_inputs(inputs)
    }

    fn partials() -> Vec<VectorField> {
        let mut a = VectorField::new(FieldLocation::Point);
        a.insert(id(1), [1.0, 0.0, 0.0]);
        a.insert(id(2), [2.0, 0.0, 0.0]);
        let mut b = VectorField::new(FieldLocation::Point);
        b.insert(id(2), [4.0, 0.0, 0.0]);
        b.insert(id(3), [3.0, 0.0, 0.0]);
        vec![a, b]
    }

    fn run(policy: OverlapPolicy) -> VectorField {
        let mut io = io_with(partials());
        let mut recon = ReconstructVectorField::new("recon", policy);
        recon.execute(&mut io).unwrap();
        let outputs = io.take_outputs();
        (**outputs[&PortTag::VectorField].as_field().unwrap()).clone()
    }

    #[test]
    fn merge_policies() {
        let overlap = id(2);
        assert_eq!(run(OverlapPolicy::First).get(overlap), Some([2.0, 0.0, 0.0]));
        assert_eq!(run(OverlapPolicy::Last).get(overlap), Some([4.0, 0.0, 0.0]));
        assert_eq!(run(OverlapPolicy::Sum).get(overlap), Some([6.0, 0.0, 0.0]));
        assert_eq!(
            run(OverlapPolicy::Average).get(overlap),
            Some([3.0, 0.0, 0.0])
        );
    }

    #[test]
    fn disjoint_ids_pass_through() {
        let out = run(OverlapPolicy::Sum);
        assert_eq!(out.len(), 3);
        assert_eq!(out.get(id(1)), Some([1.0, 0.0, 0.0]));
        assert_eq!(out.get(id(3)), Some([3.0, 0.0, 0.0]));
    }

    #[test]
    fn mismatched_locations_fail() {
        let mut a = VectorField::new(FieldLocation::Point);
        a.insert(id(1), [0.0; 3]);
        let mut b = VectorField::new(FieldLocation::Cell);
        b.insert(id(1), [0.0; 3]);
        let mut io = io_with(vec![a, b]);
        let mut recon = ReconstructVectorField::new("recon", OverlapPolicy::Sum);
        assert!(recon.execute(&mut io).is_err());
    }

    #[test]
    fn undefined_counts_as_point() {
        let mut a = VectorField::new(FieldLocation::Point);
        a.insert(id(1), [1.0, 0.0, 0.0]);
        let mut b = VectorField::new(FieldLocation::Undefined);
        b.insert(id(1), [1.0, 0.0, 0.0]);
        let mut io = io_with(vec![a, b]);
        let mut recon = ReconstructVectorField::new("recon", OverlapPolicy::Sum);
        recon.execute(&mut io).unwrap();
    }
}
