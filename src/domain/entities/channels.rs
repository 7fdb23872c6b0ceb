use std::collections::HashMap;

/// Channel membership as seen by the bot.
///
/// Maps a channel name to the nicks the bot believes are in it, in the order
/// they were learned. An entry exists exactly while the bot itself is joined.
/// Only the line dispatcher mutates it; handlers receive a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channels {
    members: HashMap<String, Vec<String>>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nicks in `channel`, or `None` if the bot is not in it
    pub fn get(&self, channel: &str) -> Option<&[String]> {
        self.members.get(channel).map(|nicks| nicks.as_slice())
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.members.contains_key(channel)
    }

    pub fn contains(&self, channel: &str, nick: &str) -> bool {
        self.members
            .get(channel)
            .is_some_and(|nicks| nicks.iter().any(|n| n == nick))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(|c| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The bot joined `channel`. An existing entry is kept as is.
    pub(crate) fn self_joined(&mut self, channel: &str) {
        self.members.entry(channel.to_string()).or_default();
    }

    /// The bot left or was kicked from `channel`
    pub(crate) fn self_left(&mut self, channel: &str) {
        self.members.remove(channel);
    }

    pub(crate) fn add_member(&mut self, channel: &str, nick: &str) {
        // Traffic for channels we are not in never creates an entry
        if let Some(nicks) = self.members.get_mut(channel) {
            if !nicks.iter().any(|n| n == nick) {
                nicks.push(nick.to_string());
            }
        }
    }

    pub(crate) fn remove_member(&mut self, channel: &str, nick: &str) {
        if let Some(nicks) = self.members.get_mut(channel) {
            nicks.retain(|n| n != nick);
        }
    }

    /// Replace the whole member list from a NAMES reply.
    ///
    /// Leading `@` / `+` status markers are stripped and duplicates dropped.
    pub(crate) fn replace<'a>(&mut self, channel: &str, names: impl IntoIterator<Item = &'a str>) {
        let mut nicks: Vec<String> = Vec::new();
        for name in names {
            let nick = name
                .strip_prefix('@')
                .or_else(|| name.strip_prefix('+'))
                .unwrap_or(name);
            if !nick.is_empty() && !nicks.iter().any(|n| n == nick) {
                nicks.push(nick.to_string());
            }
        }
        self.members.insert(channel.to_string(), nicks);
    }
}
