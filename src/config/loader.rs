use super::{get_global_config_dir, ConsoleConfig, PartialConfig};
use crate::error::{common, ConsoleError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Directory below the working directory holding the project config
pub const PROJECT_CONFIG_DIR: &str = ".opsdesk";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Accumulates configuration layers in precedence order
pub struct ConfigLoader {
    config: ConsoleConfig,
    sources: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config: ConsoleConfig::default(),
            sources: Vec::new(),
        }
    }

    /// Merge the global config file when one exists
    pub async fn load_global(&mut self) -> Result<()> {
        let path = get_global_config_dir()?.join(CONFIG_FILE_NAME);
        self.load_optional(&path).await
    }

    /// Merge `<project_dir>/.opsdesk/config.toml` when it exists
    pub async fn load_project(&mut self, project_dir: &Path) -> Result<()> {
        let path = project_dir.join(PROJECT_CONFIG_DIR).join(CONFIG_FILE_NAME);
        self.load_optional(&path).await
    }

    /// Merge an explicitly requested file; a missing file is an error
    pub async fn load_file(&mut self, path: &Path) -> Result<()> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(common::config_not_found(path));
        }
        self.merge_file(path).await
    }

    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.config.merge_env_vars()
    }

    /// Files merged so far, lowest precedence first
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Validate and hand out the merged configuration
    pub fn finish(self) -> Result<ConsoleConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    async fn load_optional(&mut self, path: &Path) -> Result<()> {
        if fs::try_exists(path).await.unwrap_or(false) {
            self.merge_file(path).await
        } else {
            debug!(path = %path.display(), "No config file");
            Ok(())
        }
    }

    async fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            ConsoleError::from(e).with_context(format!("reading {}", path.display()))
        })?;
        let layer: PartialConfig = toml::from_str(&content).map_err(|e| {
            ConsoleError::from(e).with_context(format!("in {}", path.display()))
        })?;
        debug!(path = %path.display(), "Merged config file");
        self.config.merge(layer);
        self.sources.push(path.to_path_buf());
        Ok(())
    }
}

/// Load the full layered configuration for the current directory
pub async fn load_config(explicit: Option<&Path>) -> Result<ConsoleConfig> {
    let mut loader = ConfigLoader::new();
    loader.load_global().await?;
    let cwd = std::env::current_dir()?;
    loader.load_project(&cwd).await?;
    if let Some(path) = explicit {
        loader.load_file(path).await?;
    }
    loader.merge_env_vars()?;
    loader.finish()
}
