// Local help text. Help messages are printed by the client and never sent.

use serde::{Deserialize, Serialize};

pub const STANDARD_HELP: &str = "Commands: \n\
    \x20   HELP\n\
    \x20   LIST USERS\n\
    \x20   LOGOUT\n\
    \x20   SEND FILE filepath {AS filename}\n\
    \x20 Anything else is a text message.";

/// Help request, optionally prefixed with a situation-specific note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpMessage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(super) extra_text: String,
}

impl HelpMessage {
    pub fn new(extra_text: impl Into<String>) -> Self {
        Self {
            extra_text: extra_text.into(),
        }
    }

    pub fn extra_text(&self) -> &str {
        &self.extra_text
    }

    /// Full text to show the user
    pub fn text(&self) -> String {
        if self.extra_text.is_empty() {
            STANDARD_HELP.to_string()
        } else {
            format!("{}\n{}", self.extra_text, STANDARD_HELP)
        }
    }

    pub fn data(&self) -> Vec<String> {
        vec![self.text()]
    }
}
