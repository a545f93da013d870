// CLI arguments for the clack client

use crate::cipher::{CaesarCipher, DEFAULT_ALPHABET};
use crate::endpoint::session::{SessionConfig, DEFAULT_SERVER_NAME, DEFAULT_SERVER_PORT};
use crate::error::Result;
use crate::message::WireCodec;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// clack - line-oriented chat client
///
/// Type HELP at the prompt for the list of commands.
#[derive(Debug, Parser)]
#[command(name = "clack")]
#[command(author, version, about, long_about = None)]
pub struct ClackCli {
    /// Username to put on every message
    pub username: String,

    /// Peer to connect to
    #[arg(short, long, default_value = DEFAULT_SERVER_NAME)]
    pub server: String,

    /// Port on the peer
    #[arg(short, long, default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Echo every message back locally instead of connecting to a peer
    #[arg(long)]
    pub loopback: bool,

    /// Obscure message text on the wire with this shift key (non-zero)
    #[arg(short, long, allow_hyphen_values = true)]
    pub key: Option<i64>,

    /// Characters the shift key applies to
    #[arg(long, default_value = DEFAULT_ALPHABET, requires = "key")]
    pub alphabet: String,

    /// Directory received files are written to
    #[arg(short, long, default_value = ".")]
    pub download_dir: PathBuf,

    /// Seconds to wait for the peer on connect and on each exchange
    #[arg(short, long, default_value = "10")]
    pub timeout: u64,
}

impl ClackCli {
    /// Parse from command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        Ok(SessionConfig::new(self.username.clone())?
            .with_server(self.server.clone())
            .with_port(self.port)
            .with_download_dir(self.download_dir.clone()))
    }

    /// Plain codec, or one with a cipher when `--key` was given.
    pub fn codec(&self) -> Result<WireCodec> {
        match self.key {
            Some(key) => Ok(WireCodec::with_cipher(CaesarCipher::new(key, &self.alphabet)?)),
            None => Ok(WireCodec::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
