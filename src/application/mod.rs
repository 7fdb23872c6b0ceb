//! Application layer - Protocol engine
//!
//! This layer contains:
//! - Errors: Bot, handler and config errors
//! - Messaging: Line parsing, dispatching, outbound queue
pub mod errors;
pub mod messaging;
