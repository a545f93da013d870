// Client endpoint for the clack protocol
//
// Turns typed commands into messages, hands them to a transport and
// renders whatever comes back, until the user logs out.

pub mod cli;
pub mod commands;
pub mod session;
pub mod transport;

pub use cli::ClackCli;
pub use commands::{interpret, Command};
pub use session::{Session, SessionConfig, SessionOutcome};
pub use transport::{Loopback, TcpTransport, Transport};
