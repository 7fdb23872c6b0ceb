//! Line dispatcher - Routes classified lines to membership and handlers

use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::domain::entities::{Category, Channels, Event, EventContext, EventRegistry, Matcher, Trigger};
use crate::infrastructure::config::IrcConfig;
use super::parser::{Inbound, LineParser};
use super::queue::OutboundQueue;

/// Per-connection protocol state machine.
///
/// Owns the channel membership for the connection and feeds handler output
/// into the shared outbound queue. Handlers run synchronously on the caller's
/// task, so a slow handler holds up further lines.
pub struct Dispatcher {
    config: IrcConfig,
    registry: Arc<EventRegistry>,
    queue: Arc<OutboundQueue>,
    parser: LineParser,
    channels: Channels,
}

impl Dispatcher {
    pub fn new(config: IrcConfig, registry: Arc<EventRegistry>, queue: Arc<OutboundQueue>) -> Self {
        Self {
            config,
            registry,
            queue,
            parser: LineParser::new(),
            channels: Channels::new(),
        }
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn queue(&self) -> &Arc<OutboundQueue> {
        &self.queue
    }

    /// Queue the registration lines and the connect event's commands
    pub fn handshake(&self) {
        self.queue.push(format!("NICK {}", self.config.nick));
        self.queue.push(format!(
            "USER {} foobar foobar :{}",
            self.config.username, self.config.realname
        ));
        self.dispatch_connect();
    }

    pub fn dispatch_connect(&self) {
        if let Some(event) = self.registry.lookup(&Category::Connect, Trigger::None) {
            self.invoke(&Category::Connect, event, EventContext::new());
        }
    }

    /// Fire an application-defined event by name
    pub fn dispatch_custom(&self, name: &str, message: &str) {
        let category = Category::Custom(name.to_string());
        if let Some(event) = self.registry.lookup(&category, Trigger::Text(message)) {
            let ctx = EventContext::new()
                .with_message(message)
                .with_channels(self.channels.clone());
            self.invoke(&category, event, ctx);
        }
    }

    /// Run a handler body outside any event and queue what it produces:
    ///
    /// ```ignore
    /// dispatcher.execute(|ctx| {
    ///     ctx.msg("harryjr", "you're awesome");
    ///     Ok(())
    /// });
    /// ```
    pub fn execute<F>(&self, handler: F)
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.execute_event(&Event::new(Matcher::Any, handler));
    }

    /// Run an already built event outside any trigger
    pub fn execute_event(&self, event: &Event) {
        let ctx = EventContext::new().with_channels(self.channels.clone());
        self.invoke(&Category::Custom("execute".to_string()), event, ctx);
    }

    /// Process one raw line from the server
    pub fn handle_line(&mut self, line: &str) {
        if self.config.verbose {
            tracing::info!("> {}", line.trim_end());
        } else {
            tracing::trace!("> {}", line.trim_end());
        }

        match self.parser.parse(line) {
            Inbound::Version { nick } => {
                self.queue.push(format!("NOTICE {} :\x01VERSION {}\x01", nick, self.config.version));
            }
            Inbound::Privmsg { nick, userhost, target, message } => {
                let category = if Inbound::is_channel_target(&target) {
                    Category::Channel
                } else {
                    Category::Private
                };
                if let Some(event) = self.registry.lookup(&category, Trigger::Text(&message)) {
                    let ctx = EventContext::new()
                        .with_nick(nick)
                        .with_userhost(userhost)
                        .with_channel(target)
                        .with_message(message)
                        .with_channels(self.channels.clone());
                    self.invoke(&category, event, ctx);
                }
            }
            Inbound::ErrorReply { code, target } => {
                if let Some(event) = self.registry.lookup(&Category::Error, Trigger::Code(code)) {
                    let ctx = EventContext::new()
                        .with_nick(target.clone())
                        .with_channel(target)
                        .with_channels(self.channels.clone());
                    self.invoke(&Category::Error, event, ctx);
                }
            }
            Inbound::Join { nick, channel } => {
                tracing::debug!("{} joined {}", nick, channel);
                if nick == self.config.nick {
                    self.channels.self_joined(&channel);
                } else {
                    self.channels.add_member(&channel, &nick);
                }
            }
            Inbound::Part { nick, channel } => self.leave(&channel, &nick),
            Inbound::Kick { channel, nick } => self.leave(&channel, &nick),
            Inbound::Names { channel, nicks } => {
                self.channels.replace(&channel, nicks.iter().map(|n| n.as_str()));
            }
            Inbound::Ping { token } => self.queue.push(format!("PONG {}", token)),
            Inbound::FloodPingReply => {
                tracing::debug!("Flood ping answered, unlocking queue");
                self.queue.unlock();
            }
            Inbound::Unknown => {}
        }
    }

    fn leave(&mut self, channel: &str, nick: &str) {
        tracing::debug!("{} left {}", nick, channel);
        if nick == self.config.nick {
            self.channels.self_left(channel);
        } else {
            self.channels.remove_member(channel, nick);
        }
    }

    fn invoke(&self, category: &Category, event: &Event, ctx: EventContext) {
        match event.invoke(ctx) {
            Ok(commands) => {
                tracing::debug!("[{}] handler queued {} command(s)", category, commands.len());
                self.queue.extend(commands);
            }
            Err(e) => {
                tracing::warn!("[{}] handler failed: {}", category, e);
            }
        }
    }
}
