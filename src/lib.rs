//! clack - line-oriented chat client
//!
//! This library provides the typed message model and its wire codec, the
//! shift cipher used to obscure payload text, and the client endpoint that
//! turns typed commands into messages and renders the replies.

pub mod cipher;
pub mod endpoint;
pub mod error;
pub mod message;

pub use cipher::CaesarCipher;
pub use error::{ClackError, Result};
pub use message::{Body, FileMessage, HelpMessage, Message, MessageType, WireCodec};
