//! carik-irc - An event-driven IRC bot engine
//!
//! Register handlers on an [`EventRegistry`], hand it to a [`Session`] with a
//! [`Config`], and run:
//!
//! ```no_run
//! use carik_irc::{Config, EventRegistry, Session};
//!
//! # async fn example() -> Result<(), carik_irc::BotError> {
//! let mut events = EventRegistry::new();
//! events.on_connect(|ctx| {
//!     ctx.join(["#awesome_channel"]);
//!     Ok(())
//! });
//! events.on_channel("quote", |ctx| {
//!     let channel = ctx.channel().to_string();
//!     let text = format!("{} requested a quote", ctx.nick());
//!     ctx.msg(&channel, &text);
//!     Ok(())
//! })?;
//!
//! Session::new(Config::load_env(), events).run().await
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::errors::{BotError, CommandError, ConfigError};
pub use domain::entities::{Category, EventContext, EventRegistry, Matcher};
pub use infrastructure::adapters::{Session, SessionHandle};
pub use infrastructure::config::Config;
