//! Commands accepted by the interactive shell.

use shared::domain::PostId;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  list | ls             show the posts
  create                open the create form
  update <id>           edit a post's title and body
  delete <id> | rm <id> delete a post
  help                  show this help
  quit | exit           leave
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Create,
    Update(PostId),
    Delete(PostId),
    Help,
    Quit,
}

impl ShellCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` needs a post id")]
    MissingId(&'static str),
    #[error("`{0}` is not a post id")]
    InvalidId(String),
    #[error("`{command}` takes no argument `{extra}`")]
    UnexpectedArgument {
        command: &'static str,
        extra: String,
    },
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<ShellCommand>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "list" | "ls" => ShellCommand::List,
        "create" | "new" => ShellCommand::Create,
        "update" | "edit" => ShellCommand::Update(parse_id("update", words.next())?),
        "delete" | "rm" => ShellCommand::Delete(parse_id("delete", words.next())?),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        _ => return Err(ParseError::Unknown(head.to_string())),
    };

    if let Some(extra) = words.next() {
        return Err(ParseError::UnexpectedArgument {
            command: command.name(),
            extra: extra.to_string(),
        });
    }
    Ok(Some(command))
}

fn parse_id(command: &'static str, raw: Option<&str>) -> Result<PostId, ParseError> {
    let raw = raw.ok_or(ParseError::MissingId(command))?;
    let raw = raw.strip_prefix('#').unwrap_or(raw);
    raw.parse::<i64>()
        .map(PostId)
        .map_err(|_| ParseError::InvalidId(raw.to_string()))
}
