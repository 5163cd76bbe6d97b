use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use transit_fusion::config::FusionConfig;
use transit_fusion::pipeline;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FusionConfig::parse();

    match pipeline::run(&config).await {
        Ok(summary) => info!(
            lines = summary.fusion.lines,
            stops = summary.fusion.stop_names,
            failed = summary.failed,
            "extraction complete"
        ),
        Err(e) => {
            error!(error = %e, "extraction failed");
            std::process::exit(1);
        }
    }
}
