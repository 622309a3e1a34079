//! Runtime initialization

use crate::app::{config::AppConfig, logging::init_logging};
use crate::config::{load_config, ConsoleConfig};
use anyhow::Result;
use tracing::debug;

/// Install logging and load the layered console configuration
pub async fn initialize_app(app: &AppConfig) -> Result<ConsoleConfig> {
    init_logging(app);
    let config = load_config(app.config_path.as_deref()).await?;
    debug!(
        base_url = %config.api.base_url,
        user_id = %config.user_id,
        "Configuration loaded"
    );
    Ok(config)
}
