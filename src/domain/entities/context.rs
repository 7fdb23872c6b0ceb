use super::Channels;

/// Capture groups of a successful matcher run.
///
/// Group 0 is the whole match; unmatched optional groups are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchData {
    groups: Vec<Option<String>>,
}

impl MatchData {
    pub fn from_captures(captures: &regex_lite::Captures<'_>) -> Self {
        Self {
            groups: captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// The whole matched text
    pub fn as_str(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// What a handler sees while it runs, and where it writes its commands.
///
/// Built fresh for each dispatch. Trigger fields are read-only; the command
/// list starts empty and is handed to the outbound queue, in order, once the
/// handler returns successfully.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub nick: Option<String>,
    pub userhost: Option<String>,
    pub channel: Option<String>,
    pub message: Option<String>,
    pub matched: Option<MatchData>,
    pub channels: Channels,
    commands: Vec<String>,
}

impl EventContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    pub fn with_userhost(mut self, userhost: impl Into<String>) -> Self {
        self.userhost = Some(userhost.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    pub(crate) fn with_match(mut self, matched: Option<MatchData>) -> Self {
        self.matched = matched;
        self
    }

    /// Nick of the sender, or empty when the trigger has none
    pub fn nick(&self) -> &str {
        self.nick.as_deref().unwrap_or_default()
    }

    /// Target of the trigger: a channel, or the bot's own nick for private messages
    pub fn channel(&self) -> &str {
        self.channel.as_deref().unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// Capture group `index` of the matcher, if any
    pub fn group(&self, index: usize) -> Option<&str> {
        self.matched.as_ref().and_then(|m| m.get(index))
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<String> {
        self.commands
    }

    /// Send a raw protocol line.
    pub fn raw(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Send a message to a nick or channel.
    pub fn msg(&mut self, recipient: &str, text: &str) {
        self.raw(format!("PRIVMSG {} :{}", recipient, text));
    }

    /// Send a notice to a nick or channel. Goes out as PRIVMSG.
    pub fn notice(&mut self, recipient: &str, text: &str) {
        self.raw(format!("PRIVMSG {} :{}", recipient, text));
    }

    /// Join one or more channels:
    ///
    /// ```ignore
    /// ctx.join(["#rollercoaster", "#j-lo"]);
    /// ```
    pub fn join<I, S>(&mut self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for channel in channels {
            self.raw(format!("JOIN {}", channel.as_ref()));
        }
    }

    /// Part one or more channels.
    pub fn part<I, S>(&mut self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for channel in channels {
            self.raw(format!("PART {}", channel.as_ref()));
        }
    }

    /// Kick nick from channel, with optional comment.
    pub fn kick(&mut self, channel: &str, nick: &str, comment: Option<&str>) {
        match comment {
            Some(comment) => self.raw(format!("KICK {} {} :{}", channel, nick, comment)),
            None => self.raw(format!("KICK {} {}", channel, nick)),
        }
    }

    /// Change topic of channel.
    pub fn topic(&mut self, channel: &str, topic: &str) {
        self.raw(format!("TOPIC {} :{}", channel, topic));
    }

    pub fn mode(&mut self, target: &str, flags: &str, arg: Option<&str>) {
        match arg {
            Some(arg) => self.raw(format!("MODE {} {} {}", target, flags, arg)),
            None => self.raw(format!("MODE {} {}", target, flags)),
        }
    }

    /// Ban a hostmask from channel.
    pub fn ban(&mut self, channel: &str, mask: &str) {
        self.mode(channel, "+b", Some(mask));
    }

    /// Invite one or more nicks to channel.
    pub fn invite<I, S>(&mut self, channel: &str, nicks: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for nick in nicks {
            self.raw(format!("INVITE {} {}", nick.as_ref(), channel));
        }
    }

    pub fn set_nick(&mut self, nick: &str) {
        self.raw(format!("NICK {}", nick));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw() {
        let mut ctx = EventContext::new();
        ctx.raw("SOME COMMAND");
        assert_eq!(ctx.commands(), ["SOME COMMAND"]);
    }

    #[test]
    fn test_msg_and_notice() {
        let mut ctx = EventContext::new();
        ctx.msg("#awesome", "hi there");
        ctx.notice("arnie", "psst");
        assert_eq!(ctx.commands(), ["PRIVMSG #awesome :hi there", "PRIVMSG arnie :psst"]);
    }

    #[test]
    fn test_join_and_part_multiple() {
        let mut ctx = EventContext::new();
        ctx.join(["#rollercoaster", "#j-lo"]);
        ctx.part(vec!["#awesome".to_string()]);
        assert_eq!(ctx.commands(), ["JOIN #rollercoaster", "JOIN #j-lo", "PART #awesome"]);
    }

    #[test]
    fn test_kick_with_and_without_comment() {
        let mut ctx = EventContext::new();
        ctx.kick("#x", "bob", None);
        ctx.kick("#x", "bob", Some("bye"));
        assert_eq!(ctx.commands(), ["KICK #x bob", "KICK #x bob :bye"]);
    }

    #[test]
    fn test_topic() {
        let mut ctx = EventContext::new();
        ctx.topic("#awesome", "this chan is awesome!");
        assert_eq!(ctx.commands(), ["TOPIC #awesome :this chan is awesome!"]);
    }

    #[test]
    fn test_invite_with_multiple_nicks() {
        let mut ctx = EventContext::new();
        ctx.invite("#awesome", ["arnie", "brigitte"]);
        assert_eq!(ctx.commands(), ["INVITE arnie #awesome", "INVITE brigitte #awesome"]);
    }

    #[test]
    fn test_set_nick() {
        let mut ctx = EventContext::new();
        ctx.set_nick("awesomer");
        assert_eq!(ctx.commands(), ["NICK awesomer"]);
    }

    #[test]
    fn test_mode_and_ban() {
        let mut ctx = EventContext::new();
        ctx.mode("#awesome", "+k", Some("password"));
        ctx.mode("arnie", "+x", None);
        ctx.ban("#awesome", "*!*@*");
        assert_eq!(
            ctx.commands(),
            ["MODE #awesome +k password", "MODE arnie +x", "MODE #awesome +b *!*@*"]
        );
    }

    #[test]
    fn test_match_data_groups() {
        let re = regex_lite::Regex::new(r"^echo (.*)").unwrap();
        let caps = re.captures("echo hello").unwrap();
        let data = MatchData::from_captures(&caps);

        assert_eq!(data.as_str(), "echo hello");
        assert_eq!(data.get(1), Some("hello"));
        assert_eq!(data.get(2), None);
    }
}
