//! Input line parsing

/// Text printed by `/help`
pub const HELP_TEXT: &str = "\
Commands:
  /thinking          show or hide agent thinking
  /expand <n>        show or hide the thinking process of message n
  /tool <n> [k]      show or hide details of tool k (default 1) of message n
  /health            check the chat service
  /help              show this help
  /quit              leave the chat
Anything else is sent as a chat message. Start a message with // to send
text that begins with a slash.";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat text to send
    Chat(String),
    /// Blank line
    Empty,
    /// Flip the show-thinking switch
    ToggleThinking,
    /// Expand/collapse the thinking panel of message `n` (1-based)
    Expand(usize),
    /// Expand/collapse tool `tool` of message `message` (both 1-based)
    Tool {
        /// Message number
        message: usize,
        /// Tool number within the message
        tool: usize,
    },
    /// Probe the chat service
    Health,
    /// Print help
    Help,
    /// Leave
    Quit,
    /// Slash command that didn't parse
    Invalid(String),
}

fn number(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|a| a.parse::<usize>().ok()).filter(|n| *n > 0)
}

/// Parse one input line
pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Chat(line.trim_end_matches(['\r', '\n']).to_string());
    };
    if rest.starts_with('/') {
        return Command::Chat(rest.to_string());
    }

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let first = parts.next();
    let second = parts.next();

    match name.as_str() {
        "thinking" => Command::ToggleThinking,
        "expand" => match number(first) {
            Some(n) => Command::Expand(n),
            None => Command::Invalid("usage: /expand <message number>".to_string()),
        },
        "tool" | "tools" => match (number(first), second) {
            (Some(message), None) => Command::Tool { message, tool: 1 },
            (Some(message), Some(_)) => match number(second) {
                Some(tool) => Command::Tool { message, tool },
                None => Command::Invalid("usage: /tool <message number> [tool number]".to_string()),
            },
            (None, _) => Command::Invalid("usage: /tool <message number> [tool number]".to_string()),
        },
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Invalid(format!("unknown command '/{}', try /help", other)),
    }
}
