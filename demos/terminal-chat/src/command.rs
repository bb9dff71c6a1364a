//! Input line parsing.

use parley::prelude::UserId;

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/users`: print who is online.
    Users,
    /// `/chat <id>`: ask to pair with someone.
    Chat(UserId),
    /// `/end`: leave the current chat.
    End,
    /// `/quit`: disconnect and exit.
    Quit,
    /// `/help`: list commands.
    Help,
    /// Anything else: a message for the current peer.
    Say(String),
    /// A blank line.
    Nothing,
    /// A slash command that could not be understood.
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  /users        list who is online
  /chat <id>    start a chat
  /end          end the current chat
  /quit         disconnect
  anything else is sent to your chat partner";

/// Interprets one line of input.
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line.to_owned());
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let arg = words.next();
    let extra = words.next();

    match (name, arg, extra) {
        ("users", None, _) => Command::Users,
        ("end", None, _) => Command::End,
        ("quit" | "exit", None, _) => Command::Quit,
        ("help", None, _) => Command::Help,
        ("chat", Some(id), None) => Command::Chat(UserId::new(id)),
        ("chat", _, _) => Command::Invalid("usage: /chat <id>".into()),
        ("users" | "end" | "quit" | "exit" | "help", Some(_), _) => {
            Command::Invalid(format!("/{name} takes no arguments"))
        }
        _ => Command::Invalid(format!("unknown command /{name}, try /help")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text_is_message() {
        assert_eq!(parse("  hello there "), Command::Say("hello there".into()));
    }

    #[test]
    fn test_parse_blank_is_nothing() {
        assert_eq!(parse(""), Command::Nothing);
        assert_eq!(parse("   \t"), Command::Nothing);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("/users"), Command::Users);
        assert_eq!(parse("/end"), Command::End);
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("/exit"), Command::Quit);
        assert_eq!(parse("/chat u-2"), Command::Chat(UserId::new("u-2")));
    }

    #[test]
    fn test_parse_chat_without_id_is_invalid() {
        assert!(matches!(parse("/chat"), Command::Invalid(_)));
        assert!(matches!(parse("/chat a b"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_unknown_command_is_invalid() {
        assert!(matches!(parse("/dance"), Command::Invalid(msg) if msg.contains("/dance")));
        assert!(matches!(parse("/"), Command::Invalid(_)));
        assert!(matches!(parse("/end now"), Command::Invalid(_)));
    }
}
