//! momo-keygen - MTN MoMo sandbox credential provisioning

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use momo_keygen::config::{Args, LogFormat};
use momo_keygen::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("momo_keygen={},info", args.log_level).into());
    match args.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_file(true).with_line_number(true))
            .init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  momo-keygen - MTN MoMo API key generator");
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("Gateway: {}", args.gateway_base());
    info!("Gateway timeout: {} ms", args.request_timeout_ms);
    info!("Default callback host: {}", args.default_callback_host);
    info!("Credentials are registered with the gateway when possible,");
    info!("otherwise generated locally and marked as unregistered");
    info!("======================================");

    let state = Arc::new(AppState::new(args)?);
    server::run(state).await?;

    Ok(())
}
