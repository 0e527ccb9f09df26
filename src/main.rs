use anyhow::{Context, Result};
use mockerview::integration::{open_storage, AppConfig, Capabilities, Services};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mockerview=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mockerview");

    let config = AppConfig::discover().context("loading configuration")?;
    config.validate().context("invalid configuration")?;
    info!("Data directory: {}", config.storage.data_dir.display());

    let storage = open_storage(&config).context("opening storage")?;
    let capabilities = Capabilities::probe(&config);
    let services = Services::assemble(&config, capabilities);

    mockerview::ui::run(config, storage, services)
        .map_err(|e| anyhow::anyhow!("GUI error: {}", e))?;

    Ok(())
}
