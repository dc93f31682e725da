use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttutta::{AppState, config::ServerConfig, create_router, synth::Synthesizer};

#[derive(Debug, Parser)]
#[command(author, version, about = "Bike-share route synthesis server")]
struct Args {
    /// Listen address, overrides TTUTTA_ADDR
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Fixed seed for destination picking, overrides TTUTTA_SEED
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttutta=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env().expect("valid server configuration");
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let synthesizer = match config.seed {
        Some(seed) => {
            tracing::info!("route synthesis seeded with {seed}");
            Synthesizer::seeded(seed)
        }
        None => Synthesizer::from_entropy(),
    };
    let app = create_router(AppState::new(synthesizer));

    tracing::info!("starting ttutta on http://{}", config.addr);
    axum::serve(tokio::net::TcpListener::bind(config.addr).await.unwrap(), app)
        .await
        .unwrap();
}
