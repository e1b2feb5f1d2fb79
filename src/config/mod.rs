use crate::models::Config;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the persisted configuration inside the run's temp dir.
pub const CONFIG_FILE_NAME: &str = "config";

/// Persists the resolved [`Config`] of a run.
///
/// The config is written once at the end of initialization to
/// `<temp_dir>/config` (JSON) and read back by later stages of the same run.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    temp_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigStore {
    /// Create a store for the run's temp dir, creating the directory if needed.
    ///
    /// # Arguments
    /// * `temp_dir` - Scratch directory of the run
    pub fn new<P: AsRef<Utf8Path>>(temp_dir: P) -> Result<Self> {
        let temp_dir = temp_dir.as_ref().to_path_buf();

        if !temp_dir.exists() {
            fs::create_dir_all(&temp_dir)
                .with_context(|| format!("Failed to create temp directory: {}", temp_dir))?;
        }

        Ok(Self {
            config_path: temp_dir.join(CONFIG_FILE_NAME),
            temp_dir,
        })
    }

    /// Save the resolved configuration.
    ///
    /// The JSON is written to a sibling file and renamed into place, so a
    /// reader never observes a half-written config.
    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string(config).context("Failed to serialize config to JSON")?;

        let partial_path = self.temp_dir.join(format!("{}.partial", CONFIG_FILE_NAME));
        fs::write(&partial_path, json)
            .with_context(|| format!("Failed to write config: {}", partial_path))?;
        fs::rename(&partial_path, &self.config_path)
            .with_context(|| format!("Failed to move config into place: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Load the configuration saved earlier in this run.
    ///
    /// # Returns
    /// `None` if initialization has not persisted a config yet
    pub fn load(&self) -> Result<Option<Config>> {
        if !self.config_path.exists() {
            tracing::debug!("No saved config at {}", self.config_path);
            return Ok(None);
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: Config = serde_json::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::debug!("Loaded config from {}", self.config_path);
        Ok(Some(config))
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
