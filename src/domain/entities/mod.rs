//! Domain entities - Core business objects with no I/O

pub mod channels;
pub mod context;
pub mod event;

pub use channels::Channels;
pub use context::{EventContext, MatchData};
pub use event::{Category, Event, EventHandle, EventHandler, EventRegistry, Matcher, Trigger};
