//! Line parser - Classifies raw protocol lines into inbound events

use once_cell::sync::Lazy;
use regex_lite::Regex;

static CTCP_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:(\S+)!\S+ PRIVMSG \S+ :?\x01VERSION\x01").expect("valid regex"));
static PRIVMSG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:(\S+)!(\S+) PRIVMSG (\S+) :?(.*)").expect("valid regex"));
static ERROR_REPLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:\S+ ([45]\d\d) \S+ (\S+)").expect("valid regex"));
static JOIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:(\S+)!\S+ JOIN :?(\S+)").expect("valid regex"));
static PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:(\S+)!\S+ PART :?(\S+)").expect("valid regex"));
static KICK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:\S+ KICK (\S+) (\S+)").expect("valid regex"));
static NAMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:\S+ 353 \S+ \S (\S+) :?(.*)").expect("valid regex"));
static PING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^PING :?(\S+)").expect("valid regex"));
static FLOOD_PING_PONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:\S+ PONG \S+ :excess").expect("valid regex"));

/// A classified inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// CTCP VERSION query from `nick`
    Version { nick: String },
    Privmsg {
        nick: String,
        userhost: String,
        target: String,
        message: String,
    },
    /// Numeric 4xx/5xx reply; `target` is the token after our nick
    ErrorReply { code: u16, target: String },
    Join { nick: String, channel: String },
    Part { nick: String, channel: String },
    Kick { channel: String, nick: String },
    /// RPL_NAMREPLY (353)
    Names { channel: String, nicks: Vec<String> },
    Ping { token: String },
    /// Reply to our own `PING :excess`
    FloodPingReply,
    Unknown,
}

impl Inbound {
    pub fn is_channel_target(target: &str) -> bool {
        target.starts_with('#')
    }
}

/// Parses raw lines into `Inbound` values.
///
/// Patterns are tried in a fixed priority order and the first that matches
/// wins, so a CTCP VERSION query is never seen as a plain PRIVMSG.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser;

impl LineParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, line: &str) -> Inbound {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(caps) = CTCP_VERSION.captures(line) {
            return Inbound::Version { nick: caps[1].to_string() };
        }
        if let Some(caps) = PRIVMSG.captures(line) {
            return Inbound::Privmsg {
                nick: caps[1].to_string(),
                userhost: caps[2].to_string(),
                target: caps[3].to_string(),
                message: caps[4].to_string(),
            };
        }
        if let Some(caps) = ERROR_REPLY.captures(line) {
            // Three ASCII digits always fit
            if let Ok(code) = caps[1].parse::<u16>() {
                return Inbound::ErrorReply { code, target: caps[2].to_string() };
            }
        }
        if let Some(caps) = JOIN.captures(line) {
            return Inbound::Join { nick: caps[1].to_string(), channel: caps[2].to_string() };
        }
        if let Some(caps) = PART.captures(line) {
            return Inbound::Part { nick: caps[1].to_string(), channel: caps[2].to_string() };
        }
        if let Some(caps) = KICK.captures(line) {
            return Inbound::Kick { channel: caps[1].to_string(), nick: caps[2].to_string() };
        }
        if let Some(caps) = NAMES.captures(line) {
            return Inbound::Names {
                channel: caps[1].to_string(),
                nicks: caps[2].split_whitespace().map(|n| n.to_string()).collect(),
            };
        }
        if let Some(caps) = PING.captures(line) {
            return Inbound::Ping { token: caps[1].to_string() };
        }
        if FLOOD_PING_PONG.is_match(line) {
            return Inbound::FloodPingReply;
        }
        Inbound::Unknown
    }
}
