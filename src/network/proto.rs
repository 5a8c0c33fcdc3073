//! Just enough of the IRC line format for a logging client.
//!
//! Inbound lines are split into tags, prefix, command and params; outbound
//! commands are serialized from [`Outbound`]. Anything richer is out of scope.

use chrono::{DateTime, Utc};
use std::fmt;

/// The CTCP delimiter character (`\x01`).
const CTCP_DELIM: char = '\x01';

/// One parsed inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcLine {
    pub tags: Vec<(String, Option<String>)>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcLine {
    /// Parse a line with its terminator already removed.
    ///
    /// Returns `None` for empty or command-less lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let mut tags = Vec::new();
        if let Some(stripped) = rest.strip_prefix('@') {
            let (raw_tags, tail) = stripped.split_once(' ')?;
            tags = raw_tags
                .split(';')
                .filter(|t| !t.is_empty())
                .map(|tag| match tag.split_once('=') {
                    Some((key, value)) => (key.to_string(), Some(unescape_tag_value(value))),
                    None => (tag.to_string(), None),
                })
                .collect();
            rest = tail.trim_start_matches(' ');
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (raw_prefix, tail) = stripped.split_once(' ')?;
            prefix = Some(raw_prefix.to_string());
            rest = tail.trim_start_matches(' ');
        }

        let (command, mut rest) = match rest.split_once(' ') {
            Some((command, tail)) => (command, tail),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, tail)) => {
                    params.push(param.to_string());
                    rest = tail;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Some(Self {
            tags,
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Nickname part of the prefix (`nick!user@host`).
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split(['!', '@']).next().unwrap_or(prefix))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// IRCv3 `server-time` tag, when the server sent one.
    pub fn server_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.tag("time")?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Body of a CTCP ACTION (`/me`), or `None` for a plain message.
pub fn action_text(body: &str) -> Option<&str> {
    let inner = body.strip_prefix(CTCP_DELIM)?;
    let inner = inner.strip_suffix(CTCP_DELIM).unwrap_or(inner);
    let (verb, text) = inner.split_once(' ').unwrap_or((inner, ""));
    verb.eq_ignore_ascii_case("ACTION").then_some(text)
}

/// Outbound commands a session can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Nick(String),
    User { user: String, realname: String },
    Join(String),
    Privmsg { target: String, text: String },
    Ping(String),
    Pong(String),
    Quit(String),
    /// Operator-supplied line sent verbatim.
    Raw(String),
}

/// Strip line breaks so one outbound command can never become two.
fn clean(s: &str) -> String {
    s.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nick(nick) => write!(f, "NICK {}", clean(nick)),
            Self::User { user, realname } => {
                write!(f, "USER {} 0 * :{}", clean(user), clean(realname))
            }
            Self::Join(room) => write!(f, "JOIN {}", clean(room)),
            Self::Privmsg { target, text } => {
                write!(f, "PRIVMSG {} :{}", clean(target), clean(text))
            }
            Self::Ping(token) => write!(f, "PING :{}", clean(token)),
            Self::Pong(token) => write!(f, "PONG :{}", clean(token)),
            Self::Quit(reason) => write!(f, "QUIT :{}", clean(reason)),
            Self::Raw(line) => f.write_str(&clean(line)),
        }
    }
}
