//! Message handling - Line parsing, dispatch and flood-controlled output

pub mod dispatcher;
pub mod parser;
pub mod queue;

pub use dispatcher::Dispatcher;
pub use parser::{Inbound, LineParser};
pub use queue::{drain, DrainState, OutboundQueue, Transmit};
