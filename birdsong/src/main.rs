mod server;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use birdsong_core::{bootstrap::load_config, logging};
use birdsong_ingest::{IngestConnector, StreamFilter, StreamSupervisor, TwitterStreamClient};
use birdsong_relay::{BroadcastRelay, RelayLimits};

use server::BirdsongServer;

#[derive(Parser, Debug)]
#[command(name = "birdsong")]
#[command(about = "Relays a filtered status stream to browser viewers", long_about = None)]
struct Args {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("Birdsong starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Relay between the upstream stream and viewers
    let relay = BroadcastRelay::new(RelayLimits::from(&config.relay));

    // 4. Upstream subscription; a bad filter aborts startup
    let filter = StreamFilter::from_config(&config.twitter)?;
    let client = TwitterStreamClient::new(&config.twitter)?;
    info!(
        url = %client.stream_url(),
        follow = filter.follow().len(),
        track = filter.track().len(),
        "Upstream stream configured"
    );

    let supervisor = StreamSupervisor::new(
        IngestConnector::new(Arc::new(client)),
        filter,
        Arc::new(relay.clone()),
        config.ingest.reconnect.clone(),
    );

    // 5. Serve until a shutdown signal
    BirdsongServer::new(config, relay, supervisor).start().await
}
