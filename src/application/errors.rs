//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    /// Connectivity timeout; the session reconnects from scratch
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether the session should tear down and reconnect after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BotError::Timeout(_))
    }
}

/// Event handler errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeout_is_recoverable() {
        assert!(BotError::Timeout("read".into()).is_recoverable());
        assert!(!BotError::Interrupted.is_recoverable());
        assert!(!BotError::Network("reset".into()).is_recoverable());
    }

    #[test]
    fn test_config_error_converts() {
        let err: BotError = ConfigError::MissingField("nick".into()).into();
        assert_eq!(err.to_string(), "Config file error: Missing required field: nick");
    }
}
