//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub irc: IrcConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Identity and server for one connection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IrcConfig {
    pub nick: String,
    pub server: String,
    pub port: u16,
    pub username: String,
    pub realname: String,
    /// Answer to CTCP VERSION
    pub version: String,
    /// Log every raw line read and written
    #[serde(default)]
    pub verbose: bool,
    /// Joined by the CLI's connect handler
    #[serde(default)]
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionConfig {
    pub connect_timeout_seconds: u64,
    /// Silence longer than this counts as a lost connection
    pub read_timeout_seconds: u64,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            nick: "isaac_bot".to_string(),
            server: "irc.freenode.net".to_string(),
            port: 6667,
            username: "isaac".to_string(),
            realname: "isaac".to_string(),
            version: "isaac-bot".to_string(),
            verbose: false,
            channels: Vec::new(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 30,
            read_timeout_seconds: 300,
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }
}

impl IrcConfig {
    /// `host:port` for the socket
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.irc.nick.trim().is_empty() {
            return Err(ConfigError::MissingField("irc.nick".to_string()));
        }
        if self.irc.server.trim().is_empty() {
            return Err(ConfigError::MissingField("irc.server".to_string()));
        }
        if self.irc.port == 0 {
            return Err(ConfigError::InvalidValue("irc.port must not be 0".to_string()));
        }
        if self.irc.nick.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!("irc.nick '{}' contains whitespace", self.irc.nick)));
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(nick) = std::env::var("IRC_NICK") {
            config.irc.nick = nick;
        }

        if let Ok(server) = std::env::var("IRC_SERVER") {
            config.irc.server = server;
        }

        if let Ok(port) = std::env::var("IRC_PORT") {
            match port.parse() {
                Ok(port) => config.irc.port = port,
                Err(_) => tracing::warn!("Ignoring invalid IRC_PORT: {}", port),
            }
        }

        if let Ok(username) = std::env::var("IRC_USERNAME") {
            config.irc.username = username;
        }

        if let Ok(realname) = std::env::var("IRC_REALNAME") {
            config.irc.realname = realname;
        }

        if let Ok(verbose) = std::env::var("IRC_VERBOSE") {
            config.irc.verbose = matches!(verbose.as_str(), "1" | "true" | "yes");
        }

        config
    }
}
