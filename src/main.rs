// clack client binary

use anyhow::Context;
use clack::endpoint::{ClackCli, Loopback, Session, SessionOutcome, TcpTransport, Transport};
use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging on stderr, stdout belongs to the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clack=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let cli = ClackCli::parse_args();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: ClackCli) -> anyhow::Result<()> {
    let config = cli.session_config().context("Invalid session settings")?;
    let codec = cli.codec().context("Invalid cipher settings")?;

    let outcome = if cli.loopback {
        tracing::info!("Loopback mode, messages are echoed locally");
        drive(Session::new(config, Loopback::new(codec))).await?
    } else {
        let transport = TcpTransport::connect(&config.server, config.port, codec, cli.timeout())
            .await
            .with_context(|| format!("Failed to connect to {}:{}", config.server, config.port))?;
        drive(Session::new(config, transport)).await?
    };

    if outcome == SessionOutcome::EndOfInput {
        tracing::info!("Input closed, leaving without logging out");
    }
    Ok(())
}

async fn drive<T: Transport>(mut session: Session<T>) -> anyhow::Result<SessionOutcome> {
    let outcome = session
        .run(BufReader::new(stdin()), stdout())
        .await
        .context("Session aborted")?;
    Ok(outcome)
}
