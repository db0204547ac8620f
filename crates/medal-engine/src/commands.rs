//! Prefix command parsing.

use std::sync::LazyLock;

use regex::Regex;

use medal_core::ids::MemberId;

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:<@!?(\d+)>|(\d+))$").unwrap());

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    TestRun,
    Medals,
    AllMedals,
    Collected(i64),
    CollectedRemove(i64),
    SetManual { member: MemberId, amount: i64 },
    EliteReset,
    Info,
    Commands,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TestRun => "testrun",
            Self::Medals => "medals",
            Self::AllMedals => "allmedals",
            Self::Collected(_) => "collected",
            Self::CollectedRemove(_) => "collectedremove",
            Self::SetManual { .. } => "setmanual",
            Self::EliteReset => "elitereset",
            Self::Info => "info",
            Self::Commands => "commands",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("missing argument for {command}")]
    MissingArgument { command: &'static str },
    #[error("invalid number {value:?} for {command}")]
    InvalidNumber { command: &'static str, value: String },
    #[error("invalid member {value:?} for {command}")]
    InvalidMember { command: &'static str, value: String },
}

impl ParseError {
    fn command(&self) -> &'static str {
        match self {
            Self::MissingArgument { command }
            | Self::InvalidNumber { command, .. }
            | Self::InvalidMember { command, .. } => command,
        }
    }

    /// Usage hint for the command that failed to parse.
    pub fn usage(&self, prefix: &str) -> String {
        let args = match self.command() {
            "collected" | "collectedremove" => " <number>",
            "setmanual" => " @member <number>",
            _ => "",
        };
        format!("Usage: `{prefix}{}{args}`", self.command())
    }
}

/// `None` when the message is not a known command; unknown names are not an
/// error.
pub fn parse(prefix: &str, content: &str) -> Option<Result<Command, ParseError>> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next()?;
    // The prefix must be directly followed by the name.
    if !rest.starts_with(name) {
        return None;
    }

    let command = match name {
        "testrun" => Ok(Command::TestRun),
        "medals" => Ok(Command::Medals),
        "allmedals" => Ok(Command::AllMedals),
        "collected" => amount("collected", words.next()).map(Command::Collected),
        "collectedremove" => amount("collectedremove", words.next()).map(Command::CollectedRemove),
        "setmanual" => member("setmanual", words.next()).and_then(|member| {
            amount("setmanual", words.next()).map(|amount| Command::SetManual { member, amount })
        }),
        "elitereset" => Ok(Command::EliteReset),
        "info" => Ok(Command::Info),
        "commands" | "comands" | "help" => Ok(Command::Commands),
        _ => return None,
    };
    Some(command)
}

fn amount(command: &'static str, word: Option<&str>) -> Result<i64, ParseError> {
    let word = word.ok_or(ParseError::MissingArgument { command })?;
    word.parse().map_err(|_| ParseError::InvalidNumber {
        command,
        value: word.to_string(),
    })
}

fn member(command: &'static str, word: Option<&str>) -> Result<MemberId, ParseError> {
    let word = word.ok_or(ParseError::MissingArgument { command })?;
    parse_member(word).ok_or_else(|| ParseError::InvalidMember {
        command,
        value: word.to_string(),
    })
}

/// `<@id>`, `<@!id>` or a bare id.
pub fn parse_member(word: &str) -> Option<MemberId> {
    let caps = MENTION.captures(word)?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    digits.as_str().parse().ok()
}
