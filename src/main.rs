#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

use scribe::config::AppConfig;
use scribe::config::DEFAULT_RUST_LOG;
use scribe::config::setup_address;
use scribe::serve;
use scribe::setup_app;

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(AppConfig::from_env()).await?;
    let address = setup_address()?;

    serve(app, address, CancellationToken::new()).await
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}
