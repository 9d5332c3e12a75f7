//! Stockchat Server - stock screener chat service.
//!
//! Reads screener snapshots from object storage, screens them by free-text
//! query and narrates the result through an LLM.

use anyhow::Result;
use stockchat_common::logging::init_logging_with_exclusions;
use stockchat_common::Config;
use stockchat_server::StockchatService;

#[tokio::main]
async fn main() -> Result<()> {
    // Start timing immediately for cold-start measurement
    let startup_start = std::time::Instant::now();

    // Load configuration (file + environment overrides) and validate it
    let config = Config::load_and_validate()?;

    // Initialize logging
    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("Stockchat Server v{}", env!("CARGO_PKG_VERSION"));

    let service = StockchatService::new(config)?;

    // Log startup timing before entering main service loop
    let startup_duration = startup_start.elapsed();
    tracing::info!(
        duration_ms = startup_duration.as_millis() as u64,
        "Service initialized in {:?}",
        startup_duration
    );

    service.start().await
}
