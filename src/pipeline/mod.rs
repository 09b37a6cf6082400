//! Pipeline assembly and execution: ports, pins, blocks, registry, chain.

pub mod block;
pub mod chain;
pub mod port;
pub mod registry;
pub mod trace;

pub use block::{Block, BlockKey, ExecState, PortIo};
pub use chain::Chain;
pub use port::{Direction, PayloadKind, PortPayload, PortSpec, PortTag};
pub use registry::{BlockRegistry, Pin};
pub use trace::{ChainTracer, LogTracer, NoopTracer};
