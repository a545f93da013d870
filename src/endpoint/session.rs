// Interactive session: read a line, build a message, exchange it, render the reply

use crate::endpoint::commands::interpret;
use crate::endpoint::transport::Transport;
use crate::error::{ClackError, Result};
use crate::message::{Body, Message};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::Instrument;
use uuid::Uuid;

/// Peer to talk to when none is given
pub const DEFAULT_SERVER_NAME: &str = "localhost";

/// Port in IANA's unassigned range
pub const DEFAULT_SERVER_PORT: u16 = 4466;

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub username: String,
    pub server: String,
    pub port: u16,
    /// Where received files are written
    pub download_dir: PathBuf,
}

impl SessionConfig {
    /// Defaults for everything but the username, which must not be blank.
    pub fn new(username: impl Into<String>) -> Result<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(ClackError::InvalidConfiguration(
                "username must not be empty".to_string(),
            ));
        }

        Ok(Self {
            username,
            server: DEFAULT_SERVER_NAME.to_string(),
            port: DEFAULT_SERVER_PORT,
            download_dir: PathBuf::from("."),
        })
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn prompt(&self) -> String {
        format!("{}> ", self.server)
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A LOGOUT was sent
    LoggedOut,
    /// Input ran out first
    EndOfInput,
}

/// One user's read-interpret-dispatch-render loop
pub struct Session<T: Transport> {
    config: SessionConfig,
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(config: SessionConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run until a LOGOUT has been sent or `input` is exhausted.
    ///
    /// File and transport failures are printed and the loop carries on.
    /// A help message coming back from the peer is a protocol violation
    /// and ends the session with an error.
    pub async fn run<R, W>(&mut self, input: R, output: W) -> Result<SessionOutcome>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let span = tracing::info_span!(
            "session",
            id = %Uuid::new_v4(),
            user = %self.config.username
        );
        self.run_loop(input, output).instrument(span).await
    }

    async fn run_loop<R, W>(&mut self, input: R, mut output: W) -> Result<SessionOutcome>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            "Session started against {}:{}",
            self.config.server,
            self.config.port
        );
        let mut lines = input.lines();

        loop {
            let Some(sent) = self.next_message(&mut lines, &mut output).await? else {
                tracing::info!("Input closed before logout");
                return Ok(SessionOutcome::EndOfInput);
            };

            // Help is answered locally and never dispatched
            if let Body::Help(help) = sent.body() {
                say(&mut output, &help.text()).await?;
                continue;
            }

            tracing::debug!("Sending {}", sent.message_type());
            match self.transport.exchange(&sent).await {
                Ok(reply) => self.render(&reply, &mut output).await?,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Exchange failed: {}", e);
                    say(&mut output, &format!("Could not reach peer: {}", e)).await?;
                }
                Err(e) => {
                    tracing::error!("Exchange failed: {}", e);
                    return Err(e);
                }
            }

            if sent.is_logout() {
                tracing::info!("Session ended by logout");
                return Ok(SessionOutcome::LoggedOut);
            }
        }
    }

    /// Prompt until a non-blank line arrives. `None` at end of input.
    async fn next_message<R, W>(
        &self,
        lines: &mut Lines<R>,
        output: &mut W,
    ) -> Result<Option<Message>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            output.write_all(self.config.prompt().as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            if let Some(message) = interpret(&self.config.username, &line) {
                return Ok(Some(message));
            }
        }
    }

    async fn render<W>(&self, reply: &Message, output: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match reply.body() {
            Body::File(file) => {
                say(output, &format!("Writing file {} ...", file.save_as_name())).await?;
                match file.write_file_in(&self.config.download_dir) {
                    Ok(()) => say(output, "File written.").await?,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        say(
                            output,
                            &format!("Could not write file {}. {}", file.save_as_name(), e),
                        )
                        .await?
                    }
                }
            }
            Body::Logout => say(output, "Logged out.").await?,
            Body::ListUsers => say(output, "In production this will be a users list.").await?,
            Body::Text { text } => say(output, text).await?,
            Body::Help(_) => {
                tracing::error!("Peer replied with a HELP message: {}", reply);
                return Err(ClackError::ProtocolViolation(format!(
                    "HELP messages are never exchanged, but one was received from {}",
                    reply.username()
                )));
            }
        }

        tracing::debug!("data received    : {:?}", reply.data());
        tracing::debug!("message received : {}", reply);
        Ok(())
    }
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
