//! Application configuration
//!
//! Process-level settings taken from the command line, as opposed to the
//! layered console configuration in [`crate::config`].

use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Verbosity level for logging
    pub verbose: u8,
    pub working_dir: PathBuf,
    /// Explicit `--config` file, merged above the project file
    pub config_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(verbose: u8) -> Result<Self> {
        let working_dir = std::env::current_dir()
            .map_err(|e| anyhow::anyhow!("Failed to get current directory: {}", e))?;

        Ok(Self {
            verbose,
            working_dir,
            config_path: None,
        })
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Filter directive for the verbosity level
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            2 => "trace",
            _ => "trace,hyper=debug,reqwest=debug",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            verbose: 0,
            working_dir: PathBuf::from("."),
            config_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_follows_verbosity() {
        let levels: Vec<&str> = (0..4)
            .map(|verbose| AppConfig {
                verbose,
                ..AppConfig::default()
            }
            .log_level())
            .collect();
        assert_eq!(
            levels,
            vec!["info", "debug", "trace", "trace,hyper=debug,reqwest=debug"]
        );
    }
}
