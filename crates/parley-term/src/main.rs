mod commands;
mod printer;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use parley_core::{ChannelSink, ConversationSession, ConversationView, UiCommand};
use parley_http::{ClientConfig, HttpTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they don't interleave with the conversation
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug".into()),
        )
        .init();

    let config = ClientConfig::from_env()?;
    info!(server = %config.server_url, user = %config.user_id, "starting parley");

    let transport = Arc::new(HttpTransport::new(&config));
    let sink = Arc::new(ChannelSink::new(256));
    let printer = tokio::spawn(printer::run(sink.subscribe(), config.user_id.clone()));

    let session = ConversationSession::new(config.user_id.clone(), sink.clone());
    let (view, handle) = ConversationView::new(session, transport);
    let view = tokio::spawn(view.run());

    println!("{}", commands::HELP);
    if let Some(peer) = config.peer_id.clone() {
        handle.send(UiCommand::SelectPeer(peer));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    'input: while let Some(line) = lines.next_line().await? {
        let parsed = match commands::parse_line(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                println!("? {e}");
                continue;
            }
        };
        if line.trim() == "/help" {
            println!("{}", commands::HELP);
        }
        for command in parsed {
            let stop = command == UiCommand::Shutdown;
            if !handle.send(command) || stop {
                break 'input;
            }
        }
    }

    handle.send(UiCommand::Shutdown);
    let session = view.await?;
    if let Some(notice) = session.last_notice() {
        warn!(%notice, "exiting with an unacknowledged error");
    }

    // The printer stops once the last sender is gone
    drop(session);
    drop(sink);
    printer.await?;

    info!("bye");
    Ok(())
}
