//! Query resolution through the external resolver.
//!
//! The resolver expands suite files, directories and single query files into
//! concrete `.ql` paths grouped by the language each query declares.
//! [`QueryResolutionClient`] turns that answer into [`LanguageQueries`]
//! entries: bundled suites land in the flat `builtin` list, everything resolved
//! against a search path becomes its own [`QueryGroup`].

use crate::error::ConfigError;
use crate::models::{BuiltinSuite, Language, LanguageQueries, QueryGroup, ResolvedQueries};
use anyhow::{Context, Result};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::Deserialize;

/// Answer of the external resolver.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQueriesOutput {
    /// language → query path → resolver metadata
    #[serde(default)]
    pub by_language: IndexMap<String, IndexMap<String, serde_json::Value>>,
    #[serde(default)]
    pub no_declared_language: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub multiple_declared_languages: IndexMap<String, serde_json::Value>,
}

/// The external query resolver.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryResolver: Send + Sync {
    /// Expands `queries` (files, directories or suites). `search_path` is the
    /// root used to find the libraries those queries depend on.
    async fn resolve_queries(
        &self,
        queries: Vec<String>,
        search_path: Option<Utf8PathBuf>,
    ) -> Result<ResolveQueriesOutput>;

    /// Path of the executable doing the resolution, recorded in the config.
    fn command_path(&self) -> Utf8PathBuf;
}

/// Builtin queries that must never run, matched by path suffix per language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledQueries(IndexMap<Language, Vec<String>>);

impl DisabledQueries {
    pub fn new(table: IndexMap<Language, Vec<String>>) -> Self {
        Self(table)
    }

    pub fn none() -> Self {
        Self(IndexMap::new())
    }

    pub fn is_disabled(&self, language: Language, query: &str) -> bool {
        self.0
            .get(&language)
            .is_some_and(|suffixes| suffixes.iter().any(|s| query.ends_with(s.as_str())))
    }
}

impl Default for DisabledQueries {
    fn default() -> Self {
        let mut table = IndexMap::new();
        table.insert(
            Language::Csharp,
            vec![
                "ql/src/Security Features/CWE-937/VulnerablePackage.ql".to_string(),
                "ql/src/Security Features/CWE-451/MissingXFrameOptions.ql".to_string(),
            ],
        );
        Self(table)
    }
}

pub struct QueryResolutionClient<'a> {
    resolver: &'a dyn QueryResolver,
    disabled: &'a DisabledQueries,
}

impl<'a> QueryResolutionClient<'a> {
    pub fn new(resolver: &'a dyn QueryResolver, disabled: &'a DisabledQueries) -> Self {
        Self { resolver, disabled }
    }

    /// Resolves `queries` and appends the result to `resolved`.
    ///
    /// With a `search_path` the queries are custom: every file must declare
    /// exactly one language, and the files form a new group. Without one they
    /// come from the trusted bundle and are appended to `builtin`.
    pub async fn resolve(
        &self,
        queries: Vec<String>,
        search_path: Option<Utf8PathBuf>,
        resolved: &mut ResolvedQueries,
    ) -> Result<()> {
        tracing::debug!(
            "Resolving queries {:?} (search path: {:?})",
            queries,
            search_path
        );

        let output = self
            .resolver
            .resolve_queries(queries.clone(), search_path.clone())
            .await
            .with_context(|| format!("Failed to resolve queries {:?}", queries))?;

        if search_path.is_some() {
            if !output.no_declared_language.is_empty() {
                return Err(ConfigError::NoDeclaredLanguage(
                    output.no_declared_language.keys().cloned().collect(),
                )
                .into());
            }
            if !output.multiple_declared_languages.is_empty() {
                return Err(ConfigError::MultipleDeclaredLanguages(
                    output.multiple_declared_languages.keys().cloned().collect(),
                )
                .into());
            }
        }

        for (language_name, files) in output.by_language {
            let Some(language) = Language::parse(&language_name) else {
                tracing::warn!(
                    "Ignoring {} queries for unsupported language {}",
                    files.len(),
                    language_name
                );
                continue;
            };

            let query_paths: Vec<String> = files
                .into_keys()
                .filter(|query| {
                    let disabled = self.disabled.is_disabled(language, query);
                    if disabled {
                        tracing::debug!("Skipping disabled query {}", query);
                    }
                    !disabled
                })
                .collect();

            let entry = resolved.entry(language).or_insert_with(LanguageQueries::default);
            match &search_path {
                Some(search_path) => entry.custom.push(QueryGroup {
                    search_path: search_path.clone(),
                    queries: query_paths,
                }),
                None => entry.builtin.extend(query_paths),
            }
        }

        Ok(())
    }

    /// Adds the default code scanning suite of every language.
    pub async fn add_default_queries(
        &self,
        languages: &[Language],
        resolved: &mut ResolvedQueries,
    ) -> Result<()> {
        let suites = languages
            .iter()
            .map(|language| format!("{}-code-scanning.qls", language))
            .collect();
        self.resolve(suites, None, resolved).await
    }

    /// Adds a named builtin suite for every language.
    pub async fn add_builtin_suite(
        &self,
        languages: &[Language],
        suite: BuiltinSuite,
        resolved: &mut ResolvedQueries,
    ) -> Result<()> {
        let suites = languages
            .iter()
            .map(|language| format!("{}-{}.qls", language, suite))
            .collect();
        self.resolve(suites, None, resolved).await
    }
}
