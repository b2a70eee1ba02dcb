//! Chat commands intercepted before the executor.

/// How a platform spells its commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandStyle {
    /// Only `/reset`, `/status`, `/start` (Telegram).
    #[default]
    SlashOnly,
    /// Slash forms plus bare `reset`, `status`, `start` (Slack, where the
    /// slash would otherwise open the client's own command picker).
    SlashOrBare,
}

/// A recognized command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Clear the session.
    Reset,
    /// Report the session.
    Status,
    /// Clear the session and run the daily briefing.
    Start,
}

impl Command {
    /// Resolve `text` to a command. Matching is exact and case-sensitive.
    pub fn parse(text: &str, style: CommandStyle) -> Option<Self> {
        let name = match text.strip_prefix('/') {
            Some(name) => name,
            None if style == CommandStyle::SlashOrBare => text,
            None => return None,
        };

        match name {
            "reset" => Some(Command::Reset),
            "status" => Some(Command::Status),
            "start" => Some(Command::Start),
            _ => None,
        }
    }
}
