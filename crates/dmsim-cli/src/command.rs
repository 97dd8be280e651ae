//! REPL input parsing.

use dmsim_core::activity::ActivityKind;
use dmsim_core::error::{DmsimError, Result};
use dmsim_core::theme::Theme;
use dmsim_core::thread::UserProfile;

/// Slash commands offered for completion.
pub const COMMANDS: [&str; 10] = [
    "/home", "/dms", "/open", "/back", "/new", "/mock", "/settings", "/activity", "/help", "/quit",
];

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Home,
    Dms,
    /// 1-based position in the DM list, or a thread id
    Open(String),
    Back,
    New,
    Mock,
    /// Empty edits just show the current profile.
    Settings(Vec<ProfileEdit>),
    Activity(ActivityCommand),
    Help,
    Quit,
    /// Plain text for the active thread.
    Say(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityCommand {
    Show,
    Add {
        kind: ActivityKind,
        name: String,
        comment: Option<String>,
    },
    Remove(String),
}

/// A single `field=value` pair of `/settings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEdit {
    pub field: String,
    pub value: String,
}

impl Command {
    /// Parses one line of input.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown commands and missing arguments.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map(|(name, args)| (name, args.trim()))
            .unwrap_or((rest, ""));

        match name {
            "home" => Ok(Command::Home),
            "dms" => Ok(Command::Dms),
            "open" if !args.is_empty() => Ok(Command::Open(args.to_string())),
            "open" => Err(DmsimError::validation("usage: /open <n|id>")),
            "back" => Ok(Command::Back),
            "new" => Ok(Command::New),
            "mock" => Ok(Command::Mock),
            "settings" => Ok(Command::Settings(parse_edits(args)?)),
            "activity" => Ok(Command::Activity(parse_activity(args)?)),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(DmsimError::validation(format!("unknown command: /{other}"))),
        }
    }
}

/// Splits `name=Luna personality=very dry humour` into edits.
///
/// Words without `=` continue the previous value.
fn parse_edits(args: &str) -> Result<Vec<ProfileEdit>> {
    let mut edits: Vec<ProfileEdit> = Vec::new();
    for word in args.split_whitespace() {
        if let Some((field, value)) = word.split_once('=') {
            edits.push(ProfileEdit {
                field: field.to_ascii_lowercase(),
                value: value.to_string(),
            });
            continue;
        }
        let Some(last) = edits.last_mut() else {
            return Err(DmsimError::validation(format!(
                "expected field=value, got '{word}'"
            )));
        };
        if !last.value.is_empty() {
            last.value.push(' ');
        }
        last.value.push_str(word);
    }
    Ok(edits)
}

fn parse_activity(args: &str) -> Result<ActivityCommand> {
    let mut words = args.split_whitespace();
    match words.next() {
        None => Ok(ActivityCommand::Show),
        Some("add") => {
            let usage = || DmsimError::validation("usage: /activity add <kind> <name> [comment]");
            let kind = words
                .next()
                .ok_or_else(usage)?
                .parse::<ActivityKind>()
                .map_err(DmsimError::validation)?;
            let name = words.next().ok_or_else(usage)?.to_string();
            let comment = words.collect::<Vec<_>>().join(" ");
            Ok(ActivityCommand::Add {
                kind,
                name,
                comment: (!comment.is_empty()).then_some(comment),
            })
        }
        Some("remove") => words
            .next()
            .map(|id| ActivityCommand::Remove(id.to_string()))
            .ok_or_else(|| DmsimError::validation("usage: /activity remove <id>")),
        Some(other) => Err(DmsimError::validation(format!(
            "unknown activity action: {other}"
        ))),
    }
}

/// Applies `/settings` edits to a copy of the profile.
///
/// An empty value clears an optional field.
pub fn apply_edits(profile: &UserProfile, edits: &[ProfileEdit]) -> Result<UserProfile> {
    let mut profile = profile.clone();
    for ProfileEdit { field, value } in edits {
        let optional = || (!value.is_empty()).then(|| value.clone());
        match field.as_str() {
            "name" => profile.name = value.clone(),
            "username" => profile.username = value.clone(),
            "avatar" => profile.avatar = value.clone(),
            "online" => {
                profile.is_online = value.parse().map_err(|_| {
                    DmsimError::validation(format!("online must be true or false, got '{value}'"))
                })?
            }
            "followers" => profile.followers = optional(),
            "posts" => profile.posts = optional(),
            "personality" => profile.personality = optional(),
            "language" => profile.language = optional(),
            "theme" => profile.theme = value.parse::<Theme>().map_err(DmsimError::validation)?,
            other => {
                return Err(DmsimError::validation(format!(
                    "unknown profile field: {other}"
                )));
            }
        }
    }
    Ok(profile)
}
