//! Adapters - Network integrations

pub mod irc;

pub use irc::{Session, SessionHandle, WireSink};
