// Wire codec: one JSON object per line
//
// When a cipher is configured, free-text payload fields (text, file
// contents, help notes) are obscured on the way out and restored on the
// way in. Envelope fields and file names travel as-is.

use super::file::is_usable_file_name;
use super::{Body, Message, MessageType};
use crate::cipher::CaesarCipher;
use crate::error::{ClackError, Result};

/// Frames messages for a byte stream transport
#[derive(Debug, Clone, Default)]
pub struct WireCodec {
    cipher: Option<CaesarCipher>,
}

impl WireCodec {
    /// Plain JSON frames
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON frames with payload text passed through `cipher`
    pub fn with_cipher(cipher: CaesarCipher) -> Self {
        Self {
            cipher: Some(cipher),
        }
    }

    pub fn cipher(&self) -> Option<&CaesarCipher> {
        self.cipher.as_ref()
    }

    /// Serialize to a newline-terminated frame
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        check_envelope(message)?;
        let mut bytes = match &self.cipher {
            Some(cipher) => {
                let obscured = map_payload(message.clone(), |s| cipher.encrypt(s));
                serde_json::to_vec(&obscured)?
            }
            None => serde_json::to_vec(message)?,
        };
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Deserialize one frame. An unknown type tag, a blank username or a
    /// file with no usable save-as name is a protocol violation.
    pub fn decode(&self, bytes: &[u8]) -> Result<Message> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;

        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ClackError::ProtocolViolation("frame has no type tag".to_string()))?;
        if MessageType::from_tag(tag).is_none() {
            return Err(ClackError::ProtocolViolation(format!(
                "unknown message type '{}'",
                tag
            )));
        }

        let message: Message = serde_json::from_value(value)?;
        check_envelope(&message)?;
        Ok(match &self.cipher {
            Some(cipher) => map_payload(message, |s| cipher.decrypt(s)),
            None => message,
        })
    }
}

fn check_envelope(message: &Message) -> Result<()> {
    if message.username.trim().is_empty() {
        return Err(ClackError::ProtocolViolation(
            "message has no username".to_string(),
        ));
    }
    if let Body::File(file) = &message.body {
        if !is_usable_file_name(file.save_as_name()) {
            return Err(ClackError::ProtocolViolation(format!(
                "file message has no usable save-as name ({:?})",
                file.save_as_name()
            )));
        }
    }
    Ok(())
}

fn map_payload(message: Message, f: impl Fn(&str) -> String) -> Message {
    let Message {
        timestamp,
        username,
        body,
    } = message;

    let body = match body {
        Body::Text { text } => Body::Text { text: f(&text) },
        Body::File(mut file) => {
            file.contents = file.contents.as_deref().map(&f);
            Body::File(file)
        }
        Body::Help(mut help) => {
            help.extra_text = f(&help.extra_text);
            Body::Help(help)
        }
        other @ (Body::Logout | Body::ListUsers) => other,
    };

    Message {
        timestamp,
        username,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::FileMessage;

    fn all_variants() -> Vec<Message> {
        let mut file = FileMessage::with_save_as("src/notes.txt", "Notes.txt");
        file.contents = Some("Dear Diary,\nNothing HAPPENED today.\n".to_string());

        vec![
            Message::text("alice", "Hello WORLD"),
            Message::file("alice", file),
            Message::file("alice", FileMessage::new("unread.txt")),
            Message::help_with("alice", "Could NOT read"),
            Message::help("alice"),
            Message::logout("alice"),
            Message::list_users("alice"),
        ]
    }

    #[test]
    fn test_round_trip_plain() {
        let codec = WireCodec::new();
        for message in all_variants() {
            let bytes = codec.encode(&message).unwrap();
            assert_eq!(bytes.last(), Some(&b'\n'));
            let decoded = codec.decode(&bytes).unwrap();
            assert_eq!(decoded, message);
            assert_eq!(decoded.data(), message.data());
        }
    }

    #[test]
    fn test_round_trip_with_cipher() {
        let codec = WireCodec::with_cipher(CaesarCipher::with_default_alphabet(11).unwrap());
        for message in all_variants() {
            let bytes = codec.encode(&message).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), message);
        }
    }

    #[test]
    fn test_cipher_obscures_text() {
        let codec = WireCodec::with_cipher(CaesarCipher::with_default_alphabet(1).unwrap());
        let bytes = codec.encode(&Message::text("alice", "HAL")).unwrap();
        let frame = String::from_utf8(bytes).unwrap();

        assert!(frame.contains(r#""text":"IBM""#));
        assert!(frame.contains(r#""username":"alice""#));
        assert!(frame.contains(r#""type":"TEXT""#));
    }

    #[test]
    fn test_unknown_type_is_protocol_violation() {
        let codec = WireCodec::new();
        let frame = br#"{"timestamp":"2024-03-01T12:30:00Z","username":"alice","type":"SHOUT"}"#;
        assert!(matches!(
            codec.decode(frame),
            Err(ClackError::ProtocolViolation(_))
        ));

        let untagged = br#"{"timestamp":"2024-03-01T12:30:00Z","username":"alice"}"#;
        assert!(matches!(
            codec.decode(untagged),
            Err(ClackError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_blank_username_is_protocol_violation() {
        let codec = WireCodec::new();
        for username in ["", "   "] {
            let frame = format!(
                r#"{{"timestamp":"2024-03-01T12:30:00Z","username":"{}","type":"TEXT","text":"hi"}}"#,
                username
            );
            assert!(
                matches!(
                    codec.decode(frame.as_bytes()),
                    Err(ClackError::ProtocolViolation(_))
                ),
                "{:?}",
                username
            );
        }

        assert!(matches!(
            codec.encode(&Message::text("", "x")),
            Err(ClackError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_file_without_save_as_name_is_rejected() {
        let codec = WireCodec::new();
        let frame = br#"{"timestamp":"2024-03-01T12:30:00Z","username":"mallory","type":"FILE","source_path":"x","save_as_name":"out/","contents":"boom"}"#;
        assert!(matches!(
            codec.decode(frame),
            Err(ClackError::ProtocolViolation(_))
        ));

        let message = Message::file("alice", FileMessage::with_save_as("a.txt", ".."));
        assert!(matches!(
            codec.encode(&message),
            Err(ClackError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let codec = WireCodec::new();
        assert!(matches!(codec.decode(b"not json"), Err(ClackError::Codec(_))));
    }

    #[test]
    fn test_decoded_file_name_is_sanitized() {
        let codec = WireCodec::new();
        let frame = br#"{"timestamp":"2024-03-01T12:30:00Z","username":"mallory","type":"FILE","source_path":"x","save_as_name":"/etc/cron.d/evil","contents":"boom"}"#;
        let message = codec.decode(frame).unwrap();
        match message.body() {
            Body::File(file) => assert_eq!(file.save_as_name(), "evil"),
            other => panic!("expected a file body, got {:?}", other),
        }
    }
}
