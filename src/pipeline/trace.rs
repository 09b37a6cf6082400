//! Injectable diagnostic sink for chain execution.
//!
//! Tracing is purely observational: it must not alter ordering or results.
//! The default sink, [`LogTracer`], emits through the `log` facade; callers
//! that want structured capture implement [`ChainTracer`] themselves and
//! pass it to `Chain::execute_with_tracer`.

use std::time::Duration;

use crate::pipeline::block::BlockKey;

/// Observer of chain execution events.
pub trait ChainTracer {
    fn chain_started(&mut self, _blocks: usize) {}
    fn chain_finished(&mut self, _elapsed: Duration) {}
    fn block_started(&mut self, _key: BlockKey, _name: &str, _inputs: &str) {}
    fn block_finished(
        &mut self,
        _key: BlockKey,
        _name: &str,
        _elapsed: Duration,
        _outputs: &str,
    ) {
    }
    fn block_failed(&mut self, _key: BlockKey, _name: &str, _error: &str) {}
}

/// Tracer that discards every event.
#[derive(Default)]
pub struct NoopTracer;

impl ChainTracer for NoopTracer {}

/// Tracer emitting per-block entry/exit with elapsed time via `log`.
#[derive(Default)]
pub struct LogTracer;

impl ChainTracer for LogTracer {
    fn chain_started(&mut self, blocks: usize) {
        log::debug!("chain: executing {blocks} block(s)");
    }

    fn chain_finished(&mut self, elapsed: Duration) {
        log::debug!("chain: done in {elapsed:?}");
    }

    fn block_started(&mut self, key: BlockKey, name: &str, inputs: &str) {
        log::debug!("chain: -> `{name}` [{}] inputs: {inputs}", key.index());
    }

    fn block_finished(&mut self, key: BlockKey, name: &str, elapsed: Duration, outputs: &str) {
        log::debug!(
            "chain: <- `{name}` [{}] in {elapsed:?} outputs: {outputs}",
            key.index()
        );
    }

    fn block_failed(&mut self, key: BlockKey, name: &str, error: &str) {
        log::error!("chain: `{name}` [{}] failed: {error}", key.index());
    }
}
