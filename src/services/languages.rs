//! Language selection for a run.
//!
//! Languages come from one of two places:
//! - an explicit comma-separated list (`"javascript, python"`)
//! - the repository's language statistics, when no list was given
//!
//! # Examples
//!
//! ```ignore
//! use codescan_config::services::languages::resolve_languages;
//!
//! let languages = resolve_languages(Some("js-is-not-a-language"), &api, &repo).await;
//! assert!(languages.is_err());
//! ```

use crate::error::ConfigError;
use crate::models::{Language, RepositoryNwo};
use crate::services::fetch::RepoApi;
use anyhow::{Context, Result};

/// Splits an explicit language list, dropping blank entries.
pub fn split_language_input(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Determines the languages to analyze.
///
/// # Arguments
///
/// * `input` - Explicit language list; `None` or a blank list means auto-detect
/// * `api` - Used to list the repository's languages when auto-detecting
/// * `repository` - The analyzed repository
///
/// # Returns
///
/// The languages in the order they were given (or reported by the API),
/// without duplicates. Explicit names that are not supported are an error;
/// detected names that are not supported are skipped.
pub async fn resolve_languages(
    input: Option<&str>,
    api: &dyn RepoApi,
    repository: &RepositoryNwo,
) -> Result<Vec<Language>> {
    let explicit = input.map(split_language_input).unwrap_or_default();

    let languages = if explicit.is_empty() {
        detect_languages(api, repository).await?
    } else {
        parse_explicit(&explicit)?
    };

    if languages.is_empty() {
        return Err(ConfigError::NoLanguages.into());
    }

    tracing::info!(
        "Languages to analyze: {}",
        languages
            .iter()
            .map(Language::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(languages)
}

async fn detect_languages(api: &dyn RepoApi, repository: &RepositoryNwo) -> Result<Vec<Language>> {
    let reported = api
        .list_languages(repository)
        .await
        .with_context(|| format!("Failed to detect languages of {}", repository))?;

    let mut languages = Vec::new();
    for name in reported.keys() {
        match Language::parse(&name.to_lowercase()) {
            Some(language) if !languages.contains(&language) => languages.push(language),
            Some(_) => {}
            None => tracing::debug!("Ignoring unsupported repository language {}", name),
        }
    }

    tracing::debug!("Detected {} supported languages in {}", languages.len(), repository);
    Ok(languages)
}

fn parse_explicit(names: &[String]) -> Result<Vec<Language>, ConfigError> {
    let mut languages = Vec::new();
    let mut unknown = Vec::new();

    for name in names {
        match Language::parse(name) {
            Some(language) if !languages.contains(&language) => languages.push(language),
            Some(_) => {}
            None => unknown.push(name.clone()),
        }
    }

    if !unknown.is_empty() {
        return Err(ConfigError::UnknownLanguages(unknown));
    }
    Ok(languages)
}
