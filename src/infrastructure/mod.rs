//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: The IRC socket session

pub mod config;
pub mod adapters;
