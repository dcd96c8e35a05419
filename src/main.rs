//! Qutora Probe - connectivity check for the Qutora API
//!
//! Reads client options from the environment, checks that the API answers
//! with the configured credentials and lists the root categories.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qutora_sdk::{ClientOptions, QutoraClient};

/// Main entry point for the probe.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate options from environment variables
/// 3. Build the client
/// 4. Probe the API once without retries
/// 5. List root categories through the cached service
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qutora_sdk=info,qutora_probe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = ClientOptions::from_env();
    options.validate().context("invalid QUTORA_* configuration")?;
    info!(
        base_url = %options.base_url,
        timeout_secs = options.timeout_seconds,
        max_retries = options.max_retry_attempts,
        "Configuration loaded"
    );

    let client = QutoraClient::new(options).context("failed to create client")?;

    if !client.test_connection().await {
        warn!("API did not accept the connection probe");
        anyhow::bail!("connection test failed");
    }
    info!("Connection OK");

    let categories = client
        .categories()
        .root_categories()
        .await
        .context("failed to list root categories")?;
    for category in &categories {
        info!(id = %category.id, name = %category.name, "Root category");
    }
    info!(count = categories.len(), "Probe complete");

    client.close();
    Ok(())
}
