//! Domain layer - Core protocol-independent types
//!
//! This layer contains:
//! - Entities: Events, handler context, channel membership
//! - Traits: Abstractions for infrastructure (LineSink)

pub mod entities;
pub mod traits;
