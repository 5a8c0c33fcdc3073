//! Admin console command grammar.

use crate::error::CommandError;
use crate::state::is_room;

/// Reason sent when `quit` is given none.
pub const DEFAULT_QUIT_REASON: &str = "Leaving";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Toggle echo for a room.
    Show { room: String },
    Msg { room: String, text: String },
    Join { room: String },
    /// Quit the addressed monitors and stop reading input.
    Quit { reason: String },
    /// Address one host (`Some`) or all of them (`None`).
    Use { host: Option<String> },
    Hosts,
    Help,
    /// Anything not led by the marker, passed through to the protocol.
    Raw { line: String },
}

impl ConsoleCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Show { .. } => "show",
            Self::Msg { .. } => "msg",
            Self::Join { .. } => "join",
            Self::Quit { .. } => "quit",
            Self::Use { .. } => "use",
            Self::Hosts => "hosts",
            Self::Help => "help",
            Self::Raw { .. } => "raw",
        }
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str, marker: char) -> Result<Option<ConsoleCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(marker) else {
        return Ok(Some(ConsoleCommand::Raw {
            line: line.to_string(),
        }));
    };

    let rest = rest.trim_start();
    let (verb, args) = match rest.split_once(char::is_whitespace) {
        Some((verb, args)) => (verb, args.trim()),
        None => (rest, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "show" | "showchat" => {
            let room = first_word(args).ok_or(CommandError::MissingArgument {
                command: "show",
                argument: "a room",
            })?;
            if !is_room(room) {
                return Err(CommandError::InvalidRoom(room.to_string()));
            }
            ConsoleCommand::Show {
                room: room.to_string(),
            }
        }
        "msg" => {
            let (room, text) = args
                .split_once(char::is_whitespace)
                .map(|(room, text)| (room, text.trim()))
                .filter(|(_, text)| !text.is_empty())
                .ok_or(CommandError::MissingArgument {
                    command: "msg",
                    argument: "a room and text",
                })?;
            ConsoleCommand::Msg {
                room: room.to_string(),
                text: text.to_string(),
            }
        }
        "join" => {
            let room = first_word(args).ok_or(CommandError::MissingArgument {
                command: "join",
                argument: "a room",
            })?;
            ConsoleCommand::Join {
                room: room.to_string(),
            }
        }
        "quit" => ConsoleCommand::Quit {
            reason: if args.is_empty() {
                DEFAULT_QUIT_REASON.to_string()
            } else {
                args.to_string()
            },
        },
        "use" => {
            let host = first_word(args).ok_or(CommandError::MissingArgument {
                command: "use",
                argument: "a host name or *",
            })?;
            ConsoleCommand::Use {
                host: (host != "*").then(|| host.to_string()),
            }
        }
        "hosts" => ConsoleCommand::Hosts,
        "help" => ConsoleCommand::Help,
        _ => return Err(CommandError::UnknownCommand(verb.to_string())),
    };
    Ok(Some(command))
}

fn first_word(args: &str) -> Option<&str> {
    args.split_whitespace().next()
}

/// Lines printed by `help`.
pub fn help_lines(marker: char) -> Vec<String> {
    [
        ("show <#room>", "toggle echo for a room (alias: showchat)"),
        ("msg <room> <text>", "send a message"),
        ("join <room>", "join a room"),
        ("quit [reason]", "quit and stop the console"),
        ("use <host|*>", "address one host, or all with *"),
        ("hosts", "list hosts and their state"),
        ("help", "this text"),
    ]
    .iter()
    .map(|(usage, what)| format!("  {marker}{usage:<20} {what}"))
    .chain(std::iter::once(
        "  anything else is sent to the server as-is".to_string(),
    ))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
        parse_command(line, ':')
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   \t"), Ok(None));
    }

    #[test]
    fn unmarked_lines_are_raw() {
        assert_eq!(
            parse("PRIVMSG NickServ :identify x\n"),
            Ok(Some(ConsoleCommand::Raw {
                line: "PRIVMSG NickServ :identify x".into()
            }))
        );
    }

    #[test]
    fn show_requires_a_marked_room() {
        assert_eq!(
            parse(":show #dev"),
            Ok(Some(ConsoleCommand::Show { room: "#dev".into() }))
        );
        assert_eq!(
            parse(":showchat ##ops"),
            Ok(Some(ConsoleCommand::Show {
                room: "##ops".into()
            }))
        );
        assert_eq!(parse(":show dev"), Err(CommandError::InvalidRoom("dev".into())));
        assert!(matches!(
            parse(":show"),
            Err(CommandError::MissingArgument { command: "show", .. })
        ));
    }

    #[test]
    fn msg_keeps_the_whole_text() {
        assert_eq!(
            parse(": msg #dev hello   there "),
            Ok(Some(ConsoleCommand::Msg {
                room: "#dev".into(),
                text: "hello   there".into()
            }))
        );
        assert!(parse(":msg #dev").is_err());
    }

    #[test]
    fn quit_defaults_reason() {
        assert_eq!(
            parse(":quit"),
            Ok(Some(ConsoleCommand::Quit {
                reason: DEFAULT_QUIT_REASON.into()
            }))
        );
        assert_eq!(
            parse(":QUIT gone fishing"),
            Ok(Some(ConsoleCommand::Quit {
                reason: "gone fishing".into()
            }))
        );
    }

    #[test]
    fn use_selects_or_clears() {
        assert_eq!(
            parse(":use libera"),
            Ok(Some(ConsoleCommand::Use {
                host: Some("libera".into())
            }))
        );
        assert_eq!(parse(":use *"), Ok(Some(ConsoleCommand::Use { host: None })));
    }

    #[test]
    fn unknown_commands_are_errors() {
        assert_eq!(
            parse(":frobnicate now"),
            Err(CommandError::UnknownCommand("frobnicate".into()))
        );
    }

    #[test]
    fn custom_marker() {
        assert_eq!(parse_command("/hosts", '/'), Ok(Some(ConsoleCommand::Hosts)));
        assert!(matches!(
            parse_command(":hosts", '/'),
            Ok(Some(ConsoleCommand::Raw { .. }))
        ));
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_lines(':').join("\n");
        for name in ["show", "msg", "join", "quit", "use", "hosts", "help"] {
            assert!(help.contains(&format!(":{name}")), "{name} missing");
        }
    }
}
