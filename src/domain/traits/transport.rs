use async_trait::async_trait;
use crate::application::errors::BotError;

/// Transport trait - where the outbound queue writes its lines
///
/// Implementations append the line terminator themselves.
#[async_trait]
pub trait LineSink: Send {
    /// Write one protocol line
    async fn send_line(&mut self, line: &str) -> Result<(), BotError>;
}
