use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatter=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Chatter");

    let config = match chatter::config::ChatterConfig::discover() {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; falling back to defaults", e);
            chatter::config::ChatterConfig::default()
        }
    };

    chatter::ui::run(config).map_err(|e| anyhow::anyhow!("GUI error: {e}"))?;

    Ok(())
}
