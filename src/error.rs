// Error types shared by the cipher, message model and client endpoint

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClackError {
    /// Bad cipher key/alphabet or session settings. Fatal at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A file could not be read or written.
    #[error("Could not access file '{}': {source}", .path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input that looked like a command but had the wrong shape.
    #[error("{0}")]
    MalformedCommand(String),

    /// A message type reached a place where it can never legitimately appear.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The peer could not be reached or hung up.
    #[error("Transport error: {0}")]
    Transport(#[source] io::Error),

    /// Console input/output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Timed out after {0:?} waiting for the peer")]
    Timeout(Duration),
}

impl ClackError {
    pub(crate) fn file_unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ClackError::FileUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Whether the session loop can report this and keep going.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ClackError::InvalidConfiguration(_)
                | ClackError::ProtocolViolation(_)
                | ClackError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_unavailable_display() {
        let err = ClackError::file_unavailable(
            "missing.txt",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        let text = err.to_string();
        assert!(text.contains("missing.txt"));
        assert!(text.contains("file not found"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed");
        let err: ClackError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_transport_errors_are_recoverable() {
        let err = ClackError::Transport(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(err.to_string().contains("Transport error"));
        assert!(err.is_recoverable());
        assert!(ClackError::Timeout(Duration::from_secs(5)).is_recoverable());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(!ClackError::InvalidConfiguration("key".into()).is_recoverable());
        assert!(!ClackError::ProtocolViolation("HELP reply".into()).is_recoverable());
        assert!(ClackError::MalformedCommand("bad".into()).is_recoverable());
    }
}
