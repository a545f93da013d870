// Message model for the clack protocol
//
// Every message shares an envelope (timestamp, username) and carries one
// body variant out of a closed set. The variant alone decides the message
// type tag, and `data()` exposes the variant's payload as ordered text
// fields.

pub mod file;
pub mod help;
pub mod wire;

pub use file::FileMessage;
pub use help::{HelpMessage, STANDARD_HELP};
pub use wire::WireCodec;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type tag carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    File,
    Help,
    Logout,
    ListUsers,
}

impl MessageType {
    pub const ALL: [MessageType; 5] = [
        MessageType::Text,
        MessageType::File,
        MessageType::Help,
        MessageType::Logout,
        MessageType::ListUsers,
    ];

    pub fn as_tag(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::File => "FILE",
            MessageType::Help => "HELP",
            MessageType::Logout => "LOGOUT",
            MessageType::ListUsers => "LISTUSERS",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_tag() == tag)
    }

    fn class_name(&self) -> &'static str {
        match self {
            MessageType::Text => "TextMessage",
            MessageType::File => "FileMessage",
            MessageType::Help => "HelpMessage",
            MessageType::Logout => "LogoutMessage",
            MessageType::ListUsers => "ListUsersMessage",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Variant-specific part of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Body {
    #[serde(rename = "TEXT")]
    Text { text: String },
    #[serde(rename = "FILE")]
    File(FileMessage),
    #[serde(rename = "HELP")]
    Help(HelpMessage),
    #[serde(rename = "LOGOUT")]
    Logout,
    #[serde(rename = "LISTUSERS")]
    ListUsers,
}

impl Body {
    pub fn message_type(&self) -> MessageType {
        match self {
            Body::Text { .. } => MessageType::Text,
            Body::File(_) => MessageType::File,
            Body::Help(_) => MessageType::Help,
            Body::Logout => MessageType::Logout,
            Body::ListUsers => MessageType::ListUsers,
        }
    }
}

/// A message exchanged with the peer
///
/// Constructors take the username as given. A message with a blank
/// username never reaches the wire: `SessionConfig` refuses one up front
/// and `WireCodec` rejects it in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    timestamp: DateTime<Utc>,
    username: String,
    #[serde(flatten)]
    body: Body,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(username: impl Into<String>, body: Body) -> Self {
        Self::new_at(Utc::now(), username, body)
    }

    /// Create a message with an explicit timestamp
    pub fn new_at(timestamp: DateTime<Utc>, username: impl Into<String>, body: Body) -> Self {
        Self {
            timestamp,
            username: username.into(),
            body,
        }
    }

    pub fn text(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(username, Body::Text { text: text.into() })
    }

    pub fn file(username: impl Into<String>, file: FileMessage) -> Self {
        Self::new(username, Body::File(file))
    }

    pub fn help(username: impl Into<String>) -> Self {
        Self::new(username, Body::Help(HelpMessage::default()))
    }

    pub fn help_with(username: impl Into<String>, extra_text: impl Into<String>) -> Self {
        Self::new(username, Body::Help(HelpMessage::new(extra_text)))
    }

    pub fn logout(username: impl Into<String>) -> Self {
        Self::new(username, Body::Logout)
    }

    pub fn list_users(username: impl Into<String>) -> Self {
        Self::new(username, Body::ListUsers)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// The payload as ordered text fields. Never touches the file system.
    pub fn data(&self) -> Vec<String> {
        match &self.body {
            Body::Text { text } => vec![text.clone()],
            Body::File(file) => file.data(),
            Body::Help(help) => help.data(),
            Body::Logout | Body::ListUsers => Vec::new(),
        }
    }

    pub fn is_logout(&self) -> bool {
        matches!(self.body, Body::Logout)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{class={}|timestamp={}|username={}",
            self.message_type().class_name(),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.username
        )?;
        match &self.body {
            Body::Text { text } => write!(f, "|text={}", text)?,
            Body::File(file) => write!(
                f,
                "|filePath={}|fileSaveAsName={}|fileContents={}",
                file.source_path(),
                file.save_as_name(),
                file.contents().unwrap_or_default()
            )?,
            Body::Help(help) => write!(f, "|help={}", help.text())?,
            Body::Logout | Body::ListUsers => {}
        }
        f.write_str("}")
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.message_type() == other.message_type()
            && self.timestamp == other.timestamp
            && self.username == other.username
            && self.data() == other.data()
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}
