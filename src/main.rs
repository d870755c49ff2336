use anyhow::Context;
use pagesync_lib::bootstrap::{load_config_or_default, resolve_config_path, run_app};
use pagesync_lib::bootstrap::tracing::init_tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = resolve_config_path();
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    init_tracing_subscriber(config.logging.log_dir.as_deref())?;
    tracing::info!(config = %config_path.display(), "starting pagesync");

    run_app(config).await
}
