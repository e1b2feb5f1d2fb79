//! Fetching config files and query repositories.
//!
//! Local paths are only trusted while they stay inside the repository they
//! were resolved against. Containment is decided on canonical paths, so both
//! `../` traversal and symlinks pointing out of the checkout are rejected.
//! A path that does not exist is reported separately, unless it would also
//! leave the root, in which case escaping wins.

use crate::error::ConfigError;
use crate::models::{GitHubVersion, RemoteQueries, RepositoryNwo, UserConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

static REMOTE_CONFIG_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^/]+)/([^/]+)/([^@]+)@(.*)$").expect("Invalid remote config regex")
});

/// What the content API returned for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoContent {
    /// A file; `content` is base64 and may be missing for oversized files.
    File { content: Option<String> },
    Directory,
}

/// Repository metadata API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoApi: Send + Sync {
    /// Language name → bytes of code, in the order the API reports them.
    async fn list_languages(&self, repository: &RepositoryNwo) -> Result<IndexMap<String, u64>>;

    async fn get_content(
        &self,
        repository: &RepositoryNwo,
        path: &str,
        git_ref: &str,
    ) -> Result<RepoContent>;

    async fn platform_version(&self) -> Result<GitHubVersion>;
}

/// Checks out other repositories into the run's scratch space.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoCheckout: Send + Sync {
    /// Returns the absolute path of the checkout of `repository` at `git_ref`.
    async fn checkout(
        &self,
        repository: &RepositoryNwo,
        git_ref: &str,
        temp_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf>;
}

/// A parsed `owner/repo/path@ref` config file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfigRef {
    pub repository: RepositoryNwo,
    pub path: String,
    pub git_ref: String,
}

enum Containment {
    Inside(Utf8PathBuf),
    Outside,
    Missing,
}

/// Resolves `path` against `root` without ever leaving it.
fn contain(root: &Utf8Path, path: &Utf8Path) -> Result<Containment> {
    let canonical_root = root
        .canonicalize_utf8()
        .with_context(|| format!("Failed to canonicalize {}", root))?;
    let candidate = root.join(path);

    let (resolved, exists) = match candidate.canonicalize_utf8() {
        Ok(canonical) => (canonical, true),
        Err(_) => (normalize_lexically(&canonical_root.join(path)), false),
    };

    let prefix = format!("{}{}", canonical_root, std::path::MAIN_SEPARATOR);
    let inside = format!("{}{}", resolved, std::path::MAIN_SEPARATOR).starts_with(&prefix);

    Ok(match (inside, exists) {
        (false, _) => Containment::Outside,
        (true, false) => Containment::Missing,
        (true, true) => Containment::Inside(resolved),
    })
}

/// Resolves `..` and `.` components without touching the filesystem.
pub fn normalize_lexically(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}

/// Resolves a query path inside `root` (the analyzed repository or a checkout).
pub fn resolve_within_root(
    root: &Utf8Path,
    relative: &str,
    config_file: Option<&str>,
) -> Result<Utf8PathBuf> {
    match contain(root, Utf8Path::new(relative))? {
        Containment::Inside(path) => Ok(path),
        Containment::Outside => Err(ConfigError::PathOutsideRepository {
            config_file: config_file.map(str::to_string),
            path: relative.to_string(),
        }
        .into()),
        Containment::Missing => Err(ConfigError::PathDoesNotExist {
            config_file: config_file.map(str::to_string),
            path: relative.to_string(),
        }
        .into()),
    }
}

/// A config file reference is local when it starts with `./` or names no ref.
pub fn is_local_config_ref(config_file: &str) -> bool {
    config_file.starts_with("./") || !config_file.contains('@')
}

pub fn parse_remote_config_ref(config_file: &str) -> Result<RemoteConfigRef, ConfigError> {
    let captures = REMOTE_CONFIG_REF
        .captures(config_file)
        .ok_or_else(|| ConfigError::ConfigFileRepoFormatInvalid(config_file.to_string()))?;

    Ok(RemoteConfigRef {
        repository: RepositoryNwo::new(&captures[1], &captures[2]),
        path: captures[3].to_string(),
        git_ref: captures[4].to_string(),
    })
}

/// Reads a config file from the analyzed repository.
pub fn load_local_config(config_file: &str, checkout_path: &Utf8Path) -> Result<UserConfig> {
    let path = match contain(checkout_path, Utf8Path::new(config_file))? {
        Containment::Inside(path) => path,
        Containment::Outside => {
            return Err(ConfigError::ConfigFileOutsideWorkspace(config_file.to_string()).into());
        }
        Containment::Missing => {
            return Err(ConfigError::ConfigFileDoesNotExist(config_file.to_string()).into());
        }
    };

    if path.is_dir() {
        return Err(ConfigError::ConfigFileDirectoryGiven(config_file.to_string()).into());
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path))?;

    tracing::info!("Loaded config file from {}", path);
    UserConfig::from_yaml(&text, config_file)
}

/// Fetches and parses a config file stored in another repository.
pub async fn fetch_remote_config(api: &dyn RepoApi, config_file: &str) -> Result<UserConfig> {
    let reference = parse_remote_config_ref(config_file)?;

    let content = api
        .get_content(&reference.repository, &reference.path, &reference.git_ref)
        .await
        .with_context(|| format!("Failed to fetch config file {}", config_file))?;

    let encoded = match content {
        RepoContent::File {
            content: Some(content),
        } => content,
        RepoContent::File { content: None } => {
            return Err(ConfigError::ConfigFileFormatInvalid(config_file.to_string()).into());
        }
        RepoContent::Directory => {
            return Err(ConfigError::ConfigFileDirectoryGiven(config_file.to_string()).into());
        }
    };

    let cleaned: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let text = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| ConfigError::ConfigFileFormatInvalid(config_file.to_string()))?;

    tracing::info!("Fetched config file {}", config_file);
    UserConfig::from_yaml(&text, config_file)
}

/// Checks out a remote query source.
///
/// Returns the query path to resolve and the checkout root, which is the
/// search path for the queries' libraries.
pub async fn fetch_remote_queries(
    checkout: &dyn RepoCheckout,
    remote: &RemoteQueries,
    temp_dir: &Utf8Path,
    config_file: Option<&str>,
) -> Result<(Utf8PathBuf, Utf8PathBuf)> {
    let root = checkout
        .checkout(&remote.nwo, &remote.git_ref, temp_dir)
        .await
        .with_context(|| format!("Failed to check out {}@{}", remote.nwo, remote.git_ref))?;

    let query_path = match &remote.path {
        Some(path) => resolve_within_root(&root, path, config_file)?,
        None => root.clone(),
    };

    Ok((query_path, root))
}
