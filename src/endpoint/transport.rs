// Transports: how a message reaches the peer and how its reply comes back

use crate::error::{ClackError, Result};
use crate::message::{Message, WireCodec};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Largest reply frame accepted from a peer, newline included
pub const MAX_FRAME_BYTES: u64 = 16 * 1024 * 1024;

/// Exchanges one message for one reply
///
/// Implementations handle one exchange at a time; the session never has
/// more than one in flight.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn exchange(&mut self, message: &Message) -> Result<Message>;
}

/// In-process peer that answers every message with itself
///
/// The message still goes through a full encode/decode so the reply is a
/// fresh value, the same as it would be from a real peer.
#[derive(Debug, Clone, Default)]
pub struct Loopback {
    codec: WireCodec,
}

impl Loopback {
    pub fn new(codec: WireCodec) -> Self {
        Self { codec }
    }
}

impl Transport for Loopback {
    async fn exchange(&mut self, message: &Message) -> Result<Message> {
        let frame = self.codec.encode(message)?;
        tracing::debug!("Loopback frame: {} bytes", frame.len());
        self.codec.decode(&frame)
    }
}

/// Newline-delimited JSON over a TCP connection
///
/// A failed exchange (timeout, hang-up, oversized or cut-off frame) drops
/// the connection, since a late reply could still arrive on it. The next
/// exchange opens a fresh one.
pub struct TcpTransport {
    host: String,
    port: u16,
    stream: Option<BufReader<TcpStream>>,
    codec: WireCodec,
    timeout: Duration,
    max_frame: u64,
}

impl TcpTransport {
    /// Connect to `host:port`
    pub async fn connect(host: &str, port: u16, codec: WireCodec, timeout: Duration) -> Result<Self> {
        let stream = open(host, port, timeout).await?;

        Ok(Self {
            host: host.to_string(),
            port,
            stream: Some(stream),
            codec,
            timeout,
            max_frame: MAX_FRAME_BYTES,
        })
    }

    /// Limit reply frames to `bytes`, newline included
    pub fn with_max_frame(mut self, bytes: u64) -> Self {
        self.max_frame = bytes;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

async fn open(host: &str, port: u16, timeout: Duration) -> Result<BufReader<TcpStream>> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| ClackError::Timeout(timeout))?
        .map_err(ClackError::Transport)?;
    tracing::info!("Connected to {}:{}", host, port);
    Ok(BufReader::new(stream))
}

/// Write one frame and read back exactly one line of at most `max_frame` bytes
async fn round_trip(
    stream: &mut BufReader<TcpStream>,
    frame: &[u8],
    max_frame: u64,
) -> Result<String> {
    let writer = stream.get_mut();
    writer.write_all(frame).await.map_err(ClackError::Transport)?;
    writer.flush().await.map_err(ClackError::Transport)?;

    let mut line = String::new();
    let read = (&mut *stream)
        .take(max_frame)
        .read_line(&mut line)
        .await
        .map_err(ClackError::Transport)?;

    if read == 0 {
        return Err(ClackError::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "peer closed the connection",
        )));
    }
    if !line.ends_with('\n') {
        let err = if read as u64 >= max_frame {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("reply frame exceeds {} bytes", max_frame),
            )
        } else {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer closed the connection mid-frame",
            )
        };
        return Err(ClackError::Transport(err));
    }
    Ok(line)
}

impl Transport for TcpTransport {
    async fn exchange(&mut self, message: &Message) -> Result<Message> {
        let frame = self.codec.encode(message)?;

        if self.stream.is_none() {
            tracing::info!("Reconnecting to {}:{}", self.host, self.port);
            self.stream = Some(open(&self.host, self.port, self.timeout).await?);
        }
        let stream = self.stream.as_mut().ok_or_else(|| {
            ClackError::Transport(io::Error::new(io::ErrorKind::NotConnected, "no connection"))
        })?;

        let result = match tokio::time::timeout(
            self.timeout,
            round_trip(stream, &frame, self.max_frame),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClackError::Timeout(self.timeout)),
        };

        match result {
            Ok(line) => self.codec.decode(line.trim_end().as_bytes()),
            Err(e) => {
                tracing::warn!(
                    "Dropping connection to {}:{} after failed exchange: {}",
                    self.host,
                    self.port,
                    e
                );
                self.stream = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CaesarCipher;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_loopback_echoes() {
        let mut transport = Loopback::default();
        let sent = Message::text("alice", "ping");
        let reply = transport.exchange(&sent).await.unwrap();
        assert_eq!(reply, sent);
    }

    #[tokio::test]
    async fn test_loopback_with_cipher() {
        let codec = WireCodec::with_cipher(CaesarCipher::with_default_alphabet(5).unwrap());
        let mut transport = Loopback::new(codec);
        let sent = Message::help_with("alice", "NOTE");
        assert_eq!(transport.exchange(&sent).await.unwrap(), sent);
    }

    /// Echoes each line back on every accepted connection. Replies on the
    /// first connection are held back by `first_delay`.
    async fn echo_peer(first_delay: Duration) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut delay = first_delay;
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut reader = BufReader::new(read_half);
                    let mut line = String::new();
                    while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
                        tokio::time::sleep(delay).await;
                        if write_half.write_all(line.as_bytes()).await.is_err() {
                            break;
                        }
                        line.clear();
                    }
                });
                delay = Duration::ZERO;
            }
        });
        port
    }

    async fn connect_to(port: u16, timeout: Duration) -> TcpTransport {
        TcpTransport::connect("127.0.0.1", port, WireCodec::new(), timeout)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_tcp_exchange() {
        let port = echo_peer(Duration::ZERO).await;
        let mut transport = connect_to(port, Duration::from_secs(5)).await;

        for sent in [Message::text("alice", "one"), Message::list_users("alice")] {
            let reply = transport.exchange(&sent).await.unwrap();
            assert_eq!(reply, sent);
        }
    }

    #[tokio::test]
    async fn test_late_reply_is_not_taken_for_the_next_one() {
        let port = echo_peer(Duration::from_millis(600)).await;
        let mut transport = connect_to(port, Duration::from_millis(200)).await;

        let err = transport
            .exchange(&Message::text("alice", "first"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClackError::Timeout(_)));
        assert!(!transport.is_connected());

        let reply = transport
            .exchange(&Message::text("alice", "second"))
            .await
            .unwrap();
        assert_eq!(reply.data(), vec!["second"]);
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn test_oversized_reply_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(&[b'x'; 64]).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut transport = connect_to(port, Duration::from_secs(5))
            .await
            .with_max_frame(32);

        let err = transport
            .exchange(&Message::text("alice", "hi"))
            .await
            .unwrap_err();
        match err {
            ClackError::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected a transport error, got {:?}", other),
        }
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_tcp_peer_hangs_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut transport = connect_to(port, Duration::from_secs(5)).await;

        let err = transport.exchange(&Message::text("alice", "hi")).await.unwrap_err();
        assert!(matches!(err, ClackError::Transport(_)));
        assert!(!transport.is_connected());
    }
}
