use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex_lite::Regex;

use super::{EventContext, MatchData};
use crate::application::errors::{BotError, CommandError};

/// Event handler function type
pub type EventHandler = Arc<dyn Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync>;

/// Kind of trigger an event responds to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Fired once per connection, right after registration is sent
    Connect,
    /// PRIVMSG addressed to the bot
    Private,
    /// PRIVMSG addressed to a `#channel`
    Channel,
    /// Numeric 4xx/5xx reply
    Error,
    /// Application-defined, fired by name
    Custom(String),
}

impl Category {
    /// Categories that always have a (possibly empty) list in the registry
    pub const BUILTIN: [Category; 4] = [
        Category::Connect,
        Category::Private,
        Category::Channel,
        Category::Error,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Connect => "connect",
            Category::Private => "private",
            Category::Channel => "channel",
            Category::Error => "error",
            Category::Custom(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether an event applies to a trigger
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Always matches; used for `connect`
    Any,
    /// Regex tested against the message text
    Pattern(Regex),
    /// Exact numeric reply code
    Code(u16),
}

impl Matcher {
    pub fn pattern(pattern: &str) -> Result<Self, BotError> {
        Regex::new(pattern)
            .map(Matcher::Pattern)
            .map_err(|e| BotError::Pattern(format!("{}: {}", pattern, e)))
    }
}

/// The value an incoming trigger is matched on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger<'a> {
    /// No payload (connect)
    None,
    Text(&'a str),
    Code(u16),
}

/// A registered event: matcher plus handler
#[derive(Clone)]
pub struct Event {
    pub matcher: Matcher,
    handler: EventHandler,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("matcher", &self.matcher).finish_non_exhaustive()
    }
}

impl Event {
    pub fn new<F>(matcher: Matcher, handler: F) -> Self
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            matcher,
            handler: Arc::new(handler),
        }
    }

    /// Whether this event applies to `trigger` within `category`.
    ///
    /// Error events compare codes by equality and never run a pattern.
    pub fn matches(&self, category: &Category, trigger: Trigger<'_>) -> bool {
        if *category == Category::Error {
            return matches!((&self.matcher, trigger), (Matcher::Code(code), Trigger::Code(t)) if *code == t);
        }
        match (&self.matcher, trigger) {
            (Matcher::Any, _) => true,
            (Matcher::Pattern(re), Trigger::Text(text)) => re.is_match(text),
            _ => false,
        }
    }

    /// Run the handler and return the commands it produced.
    ///
    /// The match data is computed from the context's message before the
    /// handler sees it. On error nothing is returned.
    pub fn invoke(&self, ctx: EventContext) -> Result<Vec<String>, CommandError> {
        let matched = match (&self.matcher, ctx.message.as_deref()) {
            (Matcher::Pattern(re), Some(message)) => {
                re.captures(message).map(|caps| MatchData::from_captures(&caps))
            }
            _ => None,
        };
        let mut ctx = ctx.with_match(matched);
        (self.handler)(&mut ctx)?;
        Ok(ctx.into_commands())
    }
}

/// Handle to a registration: its category and position in that list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandle {
    pub category: Category,
    pub index: usize,
}

/// Ordered event lists, one per category
#[derive(Debug, Clone)]
pub struct EventRegistry {
    events: HashMap<Category, Vec<Event>>,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        let events = Category::BUILTIN
            .iter()
            .cloned()
            .map(|category| (category, Vec::new()))
            .collect();
        Self { events }
    }

    /// Append an event to `category`'s list.
    pub fn register(&mut self, category: Category, event: Event) -> EventHandle {
        let list = self.events.entry(category.clone()).or_default();
        list.push(event);
        EventHandle {
            index: list.len() - 1,
            category,
        }
    }

    /// Register a handler with the given matcher
    pub fn on<F>(&mut self, category: Category, matcher: Matcher, handler: F) -> EventHandle
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.register(category, Event::new(matcher, handler))
    }

    /// Do something once the connection is registered, e.g. join channels.
    pub fn on_connect<F>(&mut self, handler: F) -> EventHandle
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.on(Category::Connect, Matcher::Any, handler)
    }

    /// Respond to private messages matching `pattern`.
    pub fn on_private<F>(&mut self, pattern: &str, handler: F) -> Result<EventHandle, BotError>
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Ok(self.on(Category::Private, Matcher::pattern(pattern)?, handler))
    }

    /// Respond to channel messages matching `pattern`.
    pub fn on_channel<F>(&mut self, pattern: &str, handler: F) -> Result<EventHandle, BotError>
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Ok(self.on(Category::Channel, Matcher::pattern(pattern)?, handler))
    }

    /// Respond to a numeric error reply, e.g. 401 for a missing nick/channel.
    pub fn on_error<F>(&mut self, code: u16, handler: F) -> EventHandle
    where
        F: Fn(&mut EventContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.on(Category::Error, Matcher::Code(code), handler)
    }

    /// First event in `category` matching `trigger`, in registration order
    pub fn lookup(&self, category: &Category, trigger: Trigger<'_>) -> Option<&Event> {
        self.events
            .get(category)?
            .iter()
            .find(|event| event.matches(category, trigger))
    }

    pub fn get(&self, handle: &EventHandle) -> Option<&Event> {
        self.events.get(&handle.category)?.get(handle.index)
    }

    pub fn len(&self, category: &Category) -> usize {
        self.events.get(category).map_or(0, |list| list.len())
    }

    pub fn is_empty(&self) -> bool {
        self.events.values().all(|list| list.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &'static str) -> impl Fn(&mut EventContext) -> Result<(), CommandError> {
        move |ctx| {
            ctx.raw(text);
            Ok(())
        }
    }

    #[test]
    fn test_new_registry_has_builtin_categories() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty());
        for category in Category::BUILTIN.iter() {
            assert_eq!(registry.len(category), 0);
            assert!(registry.lookup(category, Trigger::None).is_none());
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mut registry = EventRegistry::new();
        registry.on_channel("quote", reply("first")).unwrap();
        registry.on_channel("quote", reply("second")).unwrap();

        let event = registry.lookup(&Category::Channel, Trigger::Text("please quote")).unwrap();
        let commands = event.invoke(EventContext::new().with_message("please quote")).unwrap();
        assert_eq!(commands, vec!["first".to_string()]);
    }

    #[test]
    fn test_pattern_does_not_match() {
        let mut registry = EventRegistry::new();
        registry.on_private("^echo (.*)", reply("x")).unwrap();
        assert!(registry.lookup(&Category::Private, Trigger::Text("hello")).is_none());
        assert!(registry.lookup(&Category::Channel, Trigger::Text("echo hi")).is_none());
    }

    #[test]
    fn test_error_matches_by_code_only() {
        let mut registry = EventRegistry::new();
        registry.on_error(401, reply("missing"));
        registry.on(Category::Error, Matcher::pattern("40").unwrap(), reply("pattern"));

        assert!(registry.lookup(&Category::Error, Trigger::Code(401)).is_some());
        assert!(registry.lookup(&Category::Error, Trigger::Code(404)).is_none());
        assert!(registry.lookup(&Category::Error, Trigger::Text("401")).is_none());
    }

    #[test]
    fn test_connect_matches_unconditionally() {
        let mut registry = EventRegistry::new();
        let handle = registry.on_connect(reply("JOIN #x"));
        assert_eq!(handle, EventHandle { category: Category::Connect, index: 0 });
        assert!(registry.lookup(&Category::Connect, Trigger::None).is_some());
        assert!(registry.get(&handle).is_some());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut registry = EventRegistry::new();
        let result = registry.on_private("(unclosed", reply("x"));
        assert!(matches!(result, Err(BotError::Pattern(_))));
        assert_eq!(registry.len(&Category::Private), 0);
    }

    #[test]
    fn test_invoke_exposes_match_groups() {
        let event = Event::new(Matcher::pattern("^echo (.*)").unwrap(), |ctx| {
            let nick = ctx.nick().to_string();
            let said = ctx.group(1).unwrap_or_default().to_string();
            ctx.msg(&nick, &format!("You said '{}'!", said));
            Ok(())
        });
        let ctx = EventContext::new().with_nick("arnie").with_message("echo hi");
        assert_eq!(event.invoke(ctx).unwrap(), vec!["PRIVMSG arnie :You said 'hi'!".to_string()]);
    }

    #[test]
    fn test_failed_handler_returns_no_commands() {
        let event = Event::new(Matcher::Any, |ctx| {
            ctx.raw("PRIVMSG #x :partial");
            Err(CommandError::ExecutionFailed("boom".into()))
        });
        assert!(event.invoke(EventContext::new()).is_err());
    }

    #[test]
    fn test_custom_category() {
        let mut registry = EventRegistry::new();
        let category = Category::Custom("tick".into());
        registry.on(category.clone(), Matcher::pattern("^now$").unwrap(), reply("tock"));
        assert_eq!(registry.len(&category), 1);
        assert!(registry.lookup(&category, Trigger::Text("now")).is_some());
        assert_eq!(category.to_string(), "tick");
    }
}
