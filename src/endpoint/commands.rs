// Command interpreter: one line of user input becomes one message

use crate::error::{ClackError, Result};
use crate::message::file::{bare_file_name, is_usable_file_name};
use crate::message::{FileMessage, Message};

pub const INVALID_SEND_FILE: &str = "Invalid SEND FILE syntax.";

/// A recognized shape of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ListUsers,
    Logout,
    SendFile {
        path: String,
        save_as: Option<String>,
    },
    /// Anything else; carries the line exactly as typed
    Text(String),
}

impl Command {
    /// Parse a line of input.
    ///
    /// Returns `Ok(None)` for a blank line. Only the first token selects the
    /// command, case-insensitively. A `SEND FILE` line is told apart by its
    /// exact token count, never by searching for `AS`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Ok(None);
        };

        let is = |token: Option<&&str>, keyword: &str| {
            token.is_some_and(|t| t.eq_ignore_ascii_case(keyword))
        };

        let command = match first.to_ascii_uppercase().as_str() {
            "HELP" => Command::Help,
            "LIST" if is(tokens.get(1), "USERS") => Command::ListUsers,
            "LOGOUT" => Command::Logout,
            "SEND" if is(tokens.get(1), "FILE") => {
                let (path, save_as) = match tokens.len() {
                    3 => (tokens[2], None),
                    5 if is(tokens.get(3), "AS") => (tokens[2], Some(tokens[4])),
                    _ => return Err(invalid_send_file()),
                };
                // The receiver needs a file name to write to
                if !is_usable_file_name(&bare_file_name(save_as.unwrap_or(path))) {
                    return Err(invalid_send_file());
                }
                Command::SendFile {
                    path: path.to_string(),
                    save_as: save_as.map(str::to_string),
                }
            }
            _ => Command::Text(line.to_string()),
        };

        Ok(Some(command))
    }

    /// Build the message for this command, reading any file it names.
    ///
    /// File problems come back as a help message carrying the error.
    pub fn into_message(self, username: &str) -> Message {
        match self {
            Command::Help => Message::help(username),
            Command::ListUsers => Message::list_users(username),
            Command::Logout => Message::logout(username),
            Command::Text(text) => Message::text(username, text),
            Command::SendFile { path, save_as } => {
                let mut file = match save_as {
                    Some(name) => FileMessage::with_save_as(path, &name),
                    None => FileMessage::new(path),
                };
                match file.read_file() {
                    Ok(()) => Message::file(username, file),
                    Err(e) => {
                        tracing::warn!("SEND FILE failed: {}", e);
                        Message::help_with(username, e.to_string())
                    }
                }
            }
        }
    }
}

fn invalid_send_file() -> ClackError {
    ClackError::MalformedCommand(INVALID_SEND_FILE.to_string())
}

/// Turn a line of input into a message.
///
/// Returns `None` for a blank line so the caller can prompt again.
/// Malformed commands never escape as errors: they become help messages.
pub fn interpret(username: &str, line: &str) -> Option<Message> {
    match Command::parse(line) {
        Ok(command) => command.map(|c| c.into_message(username)),
        Err(e) => {
            tracing::debug!("Malformed command {:?}: {}", line, e);
            Some(Message::help_with(username, e.to_string()))
        }
    }
}
