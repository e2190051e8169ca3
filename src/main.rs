//! # Volunteer Match
//!
//! Entry point: tracing, configuration, backends, then the HTTP server.

use anyhow::Result;
use tracing::info;

use volunteer_match::config::Settings;
use volunteer_match::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    volunteer_match::telemetry::init_tracing();

    info!("Starting Volunteer Match...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        storage = ?settings.database.backend,
        analytics = ?settings.analytics.backend,
        email = ?settings.email.provider,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
