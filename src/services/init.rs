//! Building the effective configuration of a run.
//!
//! Precedence, lowest first:
//! 1. the default suite of every language (unless the config file sets
//!    `disable-default-queries`)
//! 2. queries passed with the run (`queries` input)
//! 3. the config file's `queries` list, used only when the run input is absent
//!    or starts with `+`
//!
//! Path filters only come from the config file. Every failure aborts the run
//! before anything is persisted.

use crate::config::ConfigStore;
use crate::error::{ConfigError, PATHS_IGNORE_PROPERTY, PATHS_PROPERTY};
use crate::models::{Config, Language, QueryReference, RepositoryNwo, ResolvedQueries, UserConfig};
use crate::services::fetch::{
    RepoApi, RepoCheckout, fetch_remote_config, fetch_remote_queries, is_local_config_ref,
    load_local_config, resolve_within_root,
};
use crate::services::languages::resolve_languages;
use crate::services::path_filter::validate_path_filter;
use crate::services::resolution::{DisabledQueries, QueryResolutionClient, QueryResolver};
use anyhow::Result;
use camino::Utf8PathBuf;
use std::fmt;
use std::sync::Arc;

/// Progress of one initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InitStage {
    Init,
    LanguagesResolved,
    DefaultQueriesApplied,
    OverrideQueriesApplied,
    ConfigFileQueriesApplied,
    PathsApplied,
    Validated,
    Persisted,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::LanguagesResolved => "languages resolved",
            Self::DefaultQueriesApplied => "default queries applied",
            Self::OverrideQueriesApplied => "override queries applied",
            Self::ConfigFileQueriesApplied => "config file queries applied",
            Self::PathsApplied => "paths applied",
            Self::Validated => "validated",
            Self::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct StageTracker(InitStage);

impl StageTracker {
    fn new() -> Self {
        tracing::debug!("Config initialization: {}", InitStage::Init);
        Self(InitStage::Init)
    }

    fn advance(&mut self, next: InitStage) {
        tracing::debug!("Config initialization: {} -> {}", self.0, next);
        self.0 = next;
    }
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Comma-separated languages, `None` to auto-detect.
    pub languages: Option<String>,
    /// Comma-separated `uses` references.
    pub queries: Option<String>,
    /// Local path or `owner/repo/path@ref`.
    pub config_file: Option<String>,
    pub repository: RepositoryNwo,
    /// Root of the analyzed repository.
    pub checkout_path: Utf8PathBuf,
    pub temp_dir: Utf8PathBuf,
    pub tool_cache_dir: Utf8PathBuf,
}

/// The `queries` run input, split into references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowQueries {
    pub uses: Vec<String>,
    /// Whether the config file's queries still apply.
    pub add_config_file_queries: bool,
}

impl WorkflowQueries {
    pub fn parse(input: Option<&str>) -> Self {
        let Some(input) = input.map(str::trim).filter(|input| !input.is_empty()) else {
            return Self {
                uses: Vec::new(),
                add_config_file_queries: true,
            };
        };

        let (input, add_config_file_queries) = match input.strip_prefix('+') {
            Some(rest) => (rest, true),
            None => (input, false),
        };

        Self {
            uses: input.split(',').map(str::to_string).collect(),
            add_config_file_queries,
        }
    }
}

pub struct ConfigInitializer {
    resolver: Arc<dyn QueryResolver>,
    api: Arc<dyn RepoApi>,
    checkout: Arc<dyn RepoCheckout>,
    disabled: DisabledQueries,
}

impl ConfigInitializer {
    pub fn new(
        resolver: Arc<dyn QueryResolver>,
        api: Arc<dyn RepoApi>,
        checkout: Arc<dyn RepoCheckout>,
    ) -> Self {
        Self {
            resolver,
            api,
            checkout,
            disabled: DisabledQueries::default(),
        }
    }

    pub fn with_disabled_queries(mut self, disabled: DisabledQueries) -> Self {
        self.disabled = disabled;
        self
    }

    /// Resolves the configuration of a run and persists it in the temp dir.
    pub async fn init_config(&self, options: &InitOptions) -> Result<Config> {
        let mut stages = StageTracker::new();

        let config = match options.config_file.as_deref() {
            None => self.build_default_config(options, &mut stages).await?,
            Some(config_file) => self.build_config(config_file, options, &mut stages).await?,
        };

        ConfigStore::new(&options.temp_dir)?.save(&config)?;
        stages.advance(InitStage::Persisted);

        tracing::info!(
            "Resolved {} queries for {} languages",
            config.queries.values().map(|q| q.query_count()).sum::<usize>(),
            config.languages.len()
        );
        Ok(config)
    }

    /// Configuration used when no config file is given.
    pub async fn default_config(&self, options: &InitOptions) -> Result<Config> {
        self.build_default_config(options, &mut StageTracker::new())
            .await
    }

    /// Configuration from `config_file`, merged with the run inputs.
    pub async fn load_config(&self, config_file: &str, options: &InitOptions) -> Result<Config> {
        self.build_config(config_file, options, &mut StageTracker::new())
            .await
    }

    async fn build_default_config(
        &self,
        options: &InitOptions,
        stages: &mut StageTracker,
    ) -> Result<Config> {
        let languages =
            resolve_languages(options.languages.as_deref(), &*self.api, &options.repository)
                .await?;
        stages.advance(InitStage::LanguagesResolved);

        let client = QueryResolutionClient::new(&*self.resolver, &self.disabled);
        let mut queries = ResolvedQueries::new();

        client.add_default_queries(&languages, &mut queries).await?;
        stages.advance(InitStage::DefaultQueriesApplied);

        let workflow = WorkflowQueries::parse(options.queries.as_deref());
        for uses in &workflow.uses {
            self.add_query_uses(&client, uses, None, &languages, options, &mut queries)
                .await?;
        }
        stages.advance(InitStage::OverrideQueriesApplied);

        self.finish(
            languages,
            queries,
            Vec::new(),
            Vec::new(),
            UserConfig::default(),
            options,
            stages,
        )
        .await
    }

    async fn build_config(
        &self,
        config_file: &str,
        options: &InitOptions,
        stages: &mut StageTracker,
    ) -> Result<Config> {
        let user_config = if is_local_config_ref(config_file) {
            load_local_config(config_file, &options.checkout_path)?
        } else {
            fetch_remote_config(&*self.api, config_file).await?
        };

        if let Some(name) = user_config.name(config_file)? {
            tracing::info!("Using configuration \"{}\" from {}", name, config_file);
        }
        let disable_default_queries = user_config.disable_default_queries(config_file)?;
        let file_queries = user_config.queries(config_file)?.unwrap_or_default();

        let languages =
            resolve_languages(options.languages.as_deref(), &*self.api, &options.repository)
                .await?;
        stages.advance(InitStage::LanguagesResolved);

        let client = QueryResolutionClient::new(&*self.resolver, &self.disabled);
        let mut queries = ResolvedQueries::new();

        if disable_default_queries {
            tracing::info!("Default queries disabled by {}", config_file);
        } else {
            client.add_default_queries(&languages, &mut queries).await?;
        }
        stages.advance(InitStage::DefaultQueriesApplied);

        let workflow = WorkflowQueries::parse(options.queries.as_deref());
        for uses in &workflow.uses {
            self.add_query_uses(&client, uses, None, &languages, options, &mut queries)
                .await?;
        }
        stages.advance(InitStage::OverrideQueriesApplied);

        if workflow.add_config_file_queries {
            for query in &file_queries {
                tracing::debug!(
                    "Adding config file query {}",
                    query.name.as_deref().unwrap_or(&query.uses)
                );
                self.add_query_uses(
                    &client,
                    &query.uses,
                    Some(config_file),
                    &languages,
                    options,
                    &mut queries,
                )
                .await?;
            }
        } else if !file_queries.is_empty() {
            tracing::info!(
                "Ignoring {} queries from {} in favour of the queries input",
                file_queries.len(),
                config_file
            );
        }
        stages.advance(InitStage::ConfigFileQueriesApplied);

        let paths_ignore = user_config
            .paths_ignore(config_file)?
            .iter()
            .map(|path| validate_path_filter(path, PATHS_IGNORE_PROPERTY, Some(config_file)))
            .collect::<Result<Vec<_>, _>>()?;
        let paths = user_config
            .paths(config_file)?
            .iter()
            .map(|path| validate_path_filter(path, PATHS_PROPERTY, Some(config_file)))
            .collect::<Result<Vec<_>, _>>()?;
        stages.advance(InitStage::PathsApplied);

        self.finish(
            languages,
            queries,
            paths_ignore,
            paths,
            user_config,
            options,
            stages,
        )
        .await
    }

    /// Resolves one `uses` reference into `queries`.
    async fn add_query_uses(
        &self,
        client: &QueryResolutionClient<'_>,
        uses: &str,
        config_file: Option<&str>,
        languages: &[Language],
        options: &InitOptions,
        queries: &mut ResolvedQueries,
    ) -> Result<()> {
        match QueryReference::parse(uses, config_file)? {
            QueryReference::Local(path) => {
                let query_path = resolve_within_root(&options.checkout_path, &path, config_file)?;
                client
                    .resolve(
                        vec![query_path.to_string()],
                        Some(options.checkout_path.clone()),
                        queries,
                    )
                    .await
            }
            QueryReference::BuiltinSuite(suite) => {
                client.add_builtin_suite(languages, suite, queries).await
            }
            QueryReference::Remote(remote) => {
                let (query_path, search_path) =
                    fetch_remote_queries(&*self.checkout, &remote, &options.temp_dir, config_file)
                        .await?;
                client
                    .resolve(vec![query_path.to_string()], Some(search_path), queries)
                    .await
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        languages: Vec<Language>,
        queries: ResolvedQueries,
        paths_ignore: Vec<String>,
        paths: Vec<String>,
        original_user_input: UserConfig,
        options: &InitOptions,
        stages: &mut StageTracker,
    ) -> Result<Config> {
        for &language in &languages {
            if queries.get(&language).is_none_or(|q| q.is_empty()) {
                return Err(ConfigError::NoQueries(language).into());
            }
        }
        stages.advance(InitStage::Validated);

        Ok(Config {
            languages,
            queries,
            paths_ignore,
            paths,
            original_user_input,
            temp_dir: options.temp_dir.clone(),
            tool_cache_dir: options.tool_cache_dir.clone(),
            codeql_cmd: self.resolver.command_path(),
            github_version: self.api.platform_version().await?,
        })
    }
}
