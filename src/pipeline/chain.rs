//! Chain: dependency resolution and sequential block execution.
//!
//! A chain holds non-owning handles to blocks registered in a
//! [`BlockRegistry`], derives the dependency graph from the pins whose both
//! endpoints are members, and runs every block exactly once in a valid
//! topological order. Ties between ready blocks are broken by insertion
//! order into the chain, so execution is deterministic and reproducible for
//! identical assembly code.
//!
//! Pins with an endpoint outside the member set are ignored for ordering
//! (an earlier chain's block counts as already satisfied) but still carry
//! values: the registry retains produced outputs across executions.

use std::time::Instant;

use hashbrown::{HashMap, HashSet};

use crate::error::ChainError;
use crate::pipeline::block::{BlockKey, ExecState, PortIo};
use crate::pipeline::port::{Direction, PortPayload, PortTag};
use crate::pipeline::registry::BlockRegistry;
use crate::pipeline::trace::{ChainTracer, LogTracer, NoopTracer};

/// An ordered collection of blocks plus the cached execution order derived
/// from their pins.
#[derive(Default)]
pub struct Chain {
    members: Vec<BlockKey>,
    cached_order: Option<Vec<BlockKey>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a block with the chain. Idempotent: re-adding is a no-op.
    pub fn add(&mut self, key: BlockKey) {
        if !self.members.contains(&key) {
            self.members.push(key);
            self.cached_order = None;
        }
    }

    /// Removes a block from the chain; returns whether it was a member.
    pub fn remove(&mut self, key: BlockKey) -> bool {
        match self.members.iter().position(|&k| k == key) {
            Some(idx) => {
                self.members.remove(idx);
                self.cached_order = None;
                true
            }
            None => false,
        }
    }

    pub fn members(&self) -> &[BlockKey] {
        &self.members
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.members.contains(&key)
    }

    /// The topological execution order, computed once and cached until the
    /// member set changes.
    pub fn execution_order(
        &mut self,
        registry: &BlockRegistry,
    ) -> Result<&[BlockKey], ChainError> {
        if self.cached_order.is_none() {
            self.cached_order = Some(self.compute_order(registry)?);
        }
        Ok(self
            .cached_order
            .as_deref()
            .unwrap_or_default())
    }

    /// Kahn's algorithm over the member-induced pin graph, scanning members
    /// in insertion order so equal candidates resolve deterministically.
    fn compute_order(&self, registry: &BlockRegistry) -> Result<Vec<BlockKey>, ChainError> {
        let member_set: HashSet<BlockKey> = self.members.iter().copied().collect();
        let mut in_degree: HashMap<BlockKey, usize> =
            self.members.iter().map(|&k| (k, 0)).collect();
        let mut dependents: HashMap<BlockKey, Vec<BlockKey>> =
            self.members.iter().map(|&k| (k, Vec::new())).collect();
        for pin in registry.pins() {
            if member_set.contains(&pin.source) && member_set.contains(&pin.target) {
                dependents
                    .entry(pin.source)
                    .or_default()
                    .push(pin.target);
                *in_degree.entry(pin.target).or_default() += 1;
            }
        }

        let mut order = Vec::with_capacity(self.members.len());
        let mut placed: HashSet<BlockKey> = HashSet::new();
        for _ in 0..self.members.len() {
            let next = self
                .members
                .iter()
                .copied()
                .find(|k| !placed.contains(k) && in_degree[k] == 0);
            let Some(key) = next else {
                // No zero-in-degree block left: the remainder is cyclic.
                let mut names = Vec::new();
                for &k in &self.members {
                    if !placed.contains(&k) {
                        names.push(registry.name(k)?.to_string());
                    }
                }
                return Err(ChainError::CyclicDependency(names));
            };
            placed.insert(key);
            order.push(key);
            if let Some(deps) = dependents.get(&key) {
                for &dep in deps {
                    if let Some(d) = in_degree.get_mut(&dep) {
                        *d -= 1;
                    }
                }
            }
        }
        Ok(order)
    }

    /// Runs the full chain; with `trace` enabled, per-block entry/exit and
    /// elapsed times go to the `log` facade.
    ///
    /// Returns the order in which blocks ran. A cyclic graph fails before
    /// any block executes; a failing block aborts the remainder of the chain
    /// while already-completed outputs stay in the registry for inspection.
    pub fn execute(
        &mut self,
        registry: &mut BlockRegistry,
        trace: bool,
    ) -> Result<Vec<BlockKey>, ChainError> {
        if trace {
            self.execute_with_tracer(registry, &mut LogTracer)
        } else {
            self.execute_with_tracer(registry, &mut NoopTracer)
        }
    }

    /// Like [`Chain::execute`], with an explicit diagnostic sink.
    pub fn execute_with_tracer(
        &mut self,
        registry: &mut BlockRegistry,
        tracer: &mut dyn ChainTracer,
    ) -> Result<Vec<BlockKey>, ChainError> {
        let order = self.execution_order(registry)?.to_vec();
        tracer.chain_started(order.len());
        let chain_start = Instant::now();

        for &key in &order {
            registry.set_state(key, ExecState::Ready);
        }

        for &key in &order {
            let name = registry.name(key)?.to_string();
            let inputs = self.gather_inputs(registry, key, &name)?;

            registry.set_state(key, ExecState::Running);
            let mut io = PortIo::with_inputs(inputs);
            tracer.block_started(key, &name, &io.describe_inputs());

            let started = Instant::now();
            match registry.block_mut(key)?.execute(&mut io) {
                Ok(()) => {
                    let outputs = io.describe_outputs();
                    tracer.block_finished(key, &name, started.elapsed(), &outputs);
                    registry.record_outputs(key, io.take_outputs());
                    registry.set_state(key, ExecState::Done);
                }
                Err(source) => {
                    registry.set_state(key, ExecState::Failed);
                    tracer.block_failed(key, &name, &source.to_string());
                    return Err(ChainError::BlockExecution { key, name, source });
                }
            }
        }

        tracer.chain_finished(chain_start.elapsed());
        Ok(order)
    }

    /// Pulls each declared input port's values from its incoming pins.
    ///
    /// Mandatory ports must end up with at least one produced value, whether
    /// the pin is missing or its source simply never ran.
    fn gather_inputs(
        &self,
        registry: &BlockRegistry,
        key: BlockKey,
        name: &str,
    ) -> Result<HashMap<PortTag, Vec<PortPayload>>, ChainError> {
        let specs: Vec<_> = registry
            .block(key)?
            .ports()
            .iter()
            .filter(|s| s.direction == Direction::Input)
            .copied()
            .collect();
        let mut inputs: HashMap<PortTag, Vec<PortPayload>> = HashMap::new();
        for spec in specs {
            let values: Vec<PortPayload> = registry
                .pins_into(key)
                .filter(|p| p.target_tag == spec.tag)
                .filter_map(|p| registry.output(p.source, p.source_tag).cloned())
                .collect();
            if spec.mandatory && values.is_empty() {
                return Err(ChainError::MissingInput {
                    block: name.to_string(),
                    tag: spec.tag,
                });
            }
            inputs.insert(spec.tag, values);
        }
        Ok(inputs)
    }
}
