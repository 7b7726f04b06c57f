use std::error::Error;

use ai_llm_service::telemetry;
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file. A missing file is fine
    // (settings may come from the host), an unreadable one is not.
    let dotenv = match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => return Err(e.into()),
    };

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("warn", Level::INFO))
        .with(telemetry::layer())
        .with(telemetry::foreign_layer())
        .try_init()?;

    match dotenv {
        Some(path) => info!(path = %path.display(), "loaded .env"),
        None => warn!("no .env file found, using process environment only"),
    }

    api::start().await?;

    Ok(())
}
