//! ChainError: unified error type for pipeline assembly and execution.
//!
//! Wiring errors (`TypeMismatch`, `ArityViolation`, ...) are raised while the
//! pipeline is being assembled and mean the assembly code itself is wrong;
//! they are not recoverable at run time. Chain-time errors (`CyclicDependency`,
//! `MissingInput`, `BlockExecution`) abort execution and carry enough context
//! to name the offending block.

use thiserror::Error;

use crate::pipeline::block::BlockKey;
use crate::pipeline::port::{PayloadKind, PortTag};

/// Boxed error produced by a block's `execute` implementation.
pub type BlockError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for wiring and chain execution.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A referenced block handle is not present in the registry.
    #[error("unknown block handle {0:?}")]
    UnknownBlock(BlockKey),
    /// The named port does not exist on the block, or has the wrong direction.
    #[error("block `{block}` has no {direction} port tagged {tag:?}")]
    UnknownPort {
        block: String,
        direction: &'static str,
        tag: PortTag,
    },
    /// The two ports' payload kinds differ; the pin cannot carry a value.
    #[error("type mismatch: port {source_tag:?} carries {source_kind:?}, port {target:?} expects {target_kind:?}")]
    TypeMismatch {
        source_tag: PortTag,
        source_kind: PayloadKind,
        target: PortTag,
        target_kind: PayloadKind,
    },
    /// A single-valued input port already has an incoming pin.
    #[error("arity violation: input port {tag:?} of block `{block}` is single-valued and already driven")]
    ArityViolation { block: String, tag: PortTag },
    /// A block may not feed itself.
    #[error("block `{0}` cannot be connected to itself")]
    SelfConnection(String),
    /// The requested pin does not exist.
    #[error("no pin from {src_tag:?} of `{src}` to {dst_tag:?} of `{dst}`")]
    NoSuchPin {
        src: String,
        src_tag: PortTag,
        dst: String,
        dst_tag: PortTag,
    },
    /// The chain's pin graph contains a cycle; the unresolved remainder is named.
    #[error("cyclic dependency among blocks: {0:?}")]
    CyclicDependency(Vec<String>),
    /// A mandatory input port has no produced value at execution time.
    #[error("missing input: mandatory port {tag:?} of block `{block}` has no value")]
    MissingInput { block: String, tag: PortTag },
    /// A block's computation reported a domain failure; the chain aborts.
    #[error("block `{name}` ({key:?}) failed: {source}")]
    BlockExecution {
        key: BlockKey,
        name: String,
        #[source]
        source: BlockError,
    },
}
