//! Settings of one run, layered with the `config` crate.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional settings file (YAML, TOML or JSON, picked by extension)
//! 3. `CODESCAN_*` environment variables, e.g. `CODESCAN_LANGUAGES=go,java`

use crate::models::RepositoryNwo;
use crate::services::init::InitOptions;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

pub const ENV_PREFIX: &str = "CODESCAN";

#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    /// Comma-separated languages; blank means auto-detect.
    pub languages: Option<String>,
    /// Comma-separated `uses` references; a leading `+` adds to the config file's queries.
    pub queries: Option<String>,
    /// Local path or `owner/repo/path@ref`.
    pub config_file: Option<String>,
    /// `owner/repo` of the analyzed repository.
    pub repository: Option<String>,
    pub checkout_path: Utf8PathBuf,
    pub temp_dir: Utf8PathBuf,
    pub tool_cache_dir: Utf8PathBuf,
    pub codeql_path: Utf8PathBuf,
    pub server_url: String,
    pub api_url: String,
    pub token: Option<String>,
    pub resolver_timeout_secs: u64,
    pub debug: bool,
    pub log_dir: Option<Utf8PathBuf>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl RunSettings {
    /// Loads settings from the optional file and the process environment.
    pub fn load(settings_file: Option<&Utf8Path>) -> Result<Self> {
        Self::load_with_env(settings_file, None)
    }

    /// Like [`RunSettings::load`], with `env` standing in for the process
    /// environment when given.
    pub fn load_with_env(
        settings_file: Option<&Utf8Path>,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self> {
        let temp_dir = std::env::temp_dir().join("codescan");
        let tool_cache_dir = std::env::temp_dir().join("codescan-tools");

        let mut builder = ::config::Config::builder()
            .set_default("checkout_path", ".")?
            .set_default("temp_dir", temp_dir.to_string_lossy().to_string())?
            .set_default("tool_cache_dir", tool_cache_dir.to_string_lossy().to_string())?
            .set_default("codeql_path", "codeql")?
            .set_default("server_url", "https://github.com")?
            .set_default("api_url", "https://api.github.com")?
            .set_default("resolver_timeout_secs", 300)?
            .set_default("debug", false)?;

        if let Some(path) = settings_file {
            builder = builder.add_source(::config::File::from(path.as_std_path()).required(true));
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).source(env))
            .build()
            .context("Failed to load settings")?
            .try_deserialize::<RunSettings>()
            .context("Invalid settings")?;

        tracing::debug!(
            "Settings loaded (file: {:?}, repository: {:?})",
            settings_file,
            settings.repository
        );
        Ok(settings)
    }

    pub fn languages_input(&self) -> Option<&str> {
        non_blank(&self.languages)
    }

    pub fn queries_input(&self) -> Option<&str> {
        non_blank(&self.queries)
    }

    pub fn config_file(&self) -> Option<&str> {
        non_blank(&self.config_file)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_secs(self.resolver_timeout_secs)
    }

    pub fn repository(&self) -> Result<RepositoryNwo> {
        non_blank(&self.repository)
            .context("No repository given, set CODESCAN_REPOSITORY to owner/repo")?
            .parse()
    }

    pub fn init_options(&self) -> Result<InitOptions> {
        Ok(InitOptions {
            languages: self.languages_input().map(str::to_string),
            queries: self.queries_input().map(str::to_string),
            config_file: self.config_file().map(str::to_string),
            repository: self.repository()?,
            checkout_path: self.checkout_path.clone(),
            temp_dir: self.temp_dir.clone(),
            tool_cache_dir: self.tool_cache_dir.clone(),
        })
    }
}
