//! Hand-written fakes for the resolver, repository API and checkout seams.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use camino::{Utf8Path, Utf8PathBuf};
use codescan_config::models::{GitHubVersion, RepositoryNwo};
use codescan_config::services::{
    InitOptions, QueryResolver, RepoApi, RepoCheckout, RepoContent, ResolveQueriesOutput,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

pub type ResolverCall = (Vec<String>, Option<Utf8PathBuf>);

/// Resolves `<lang>-<suite>.qls` to one bundled query per suite, and a query
/// directory to every `.ql` file in it, declared as `custom_language`.
///
/// A directory containing a file named `NO_LANGUAGE` reports its queries as
/// declaring no language.
pub struct FakeResolver {
    pub custom_language: String,
    pub calls: Mutex<Vec<ResolverCall>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::with_custom_language("javascript")
    }

    pub fn with_custom_language(language: &str) -> Self {
        Self {
            custom_language: language.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ResolverCall> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn bundled_query(suite: &str) -> String {
    format!("/bundle/{}.ql", suite.trim_end_matches(".qls"))
}

#[async_trait]
impl QueryResolver for FakeResolver {
    async fn resolve_queries(
        &self,
        queries: Vec<String>,
        search_path: Option<Utf8PathBuf>,
    ) -> Result<ResolveQueriesOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((queries.clone(), search_path.clone()));

        let mut output = ResolveQueriesOutput::default();
        for query in queries {
            if query.ends_with(".qls") {
                let language = query
                    .split('-')
                    .next()
                    .ok_or_else(|| anyhow!("bad suite {}", query))?
                    .to_string();
                output
                    .by_language
                    .entry(language)
                    .or_default()
                    .insert(bundled_query(&query), serde_json::json!({}));
                continue;
            }

            let dir = Utf8PathBuf::from(&query);
            let mut files: Vec<String> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| Utf8PathBuf::try_from(entry.path()).ok())
                .filter(|path| path.extension() == Some("ql"))
                .map(|path| path.to_string())
                .collect();
            files.sort();

            if dir.join("NO_LANGUAGE").exists() {
                for file in files {
                    output.no_declared_language.insert(file, serde_json::json!({}));
                }
            } else {
                let bucket = output
                    .by_language
                    .entry(self.custom_language.clone())
                    .or_default();
                for file in files {
                    bucket.insert(file, serde_json::json!({}));
                }
            }
        }
        Ok(output)
    }

    fn command_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from("/opt/codeql/codeql")
    }
}

/// Serves languages and file contents from memory.
pub struct FakeApi {
    pub languages: IndexMap<String, u64>,
    pub files: HashMap<String, RepoContent>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            languages: IndexMap::new(),
            files: HashMap::new(),
        }
    }

    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        for (i, language) in languages.iter().enumerate() {
            self.languages.insert(language.to_string(), 100 - i as u64);
        }
        self
    }

    /// Registers `owner/repo/path@ref` with `text` as its content.
    pub fn with_file(mut self, reference: &str, text: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        self.files.insert(
            reference.to_string(),
            RepoContent::File {
                content: Some(encoded),
            },
        );
        self
    }
}

#[async_trait]
impl RepoApi for FakeApi {
    async fn list_languages(&self, _repository: &RepositoryNwo) -> Result<IndexMap<String, u64>> {
        Ok(self.languages.clone())
    }

    async fn get_content(
        &self,
        repository: &RepositoryNwo,
        path: &str,
        git_ref: &str,
    ) -> Result<RepoContent> {
        let key = format!("{}/{}@{}", repository, path, git_ref);
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {}", key))
    }

    async fn platform_version(&self) -> Result<GitHubVersion> {
        Ok(GitHubVersion::Dotcom)
    }
}

/// "Checks out" by creating `<temp>/<owner>/<repo>/<ref>`; tests put query
/// files there beforehand.
pub struct FakeCheckout {
    pub calls: Mutex<Vec<String>>,
}

impl FakeCheckout {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RepoCheckout for FakeCheckout {
    async fn checkout(
        &self,
        repository: &RepositoryNwo,
        git_ref: &str,
        temp_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}@{}", repository, git_ref));

        let location = temp_dir
            .join(&repository.owner)
            .join(&repository.repo)
            .join(git_ref);
        fs::create_dir_all(&location)?;
        Ok(location)
    }
}

/// A scratch checkout of the analyzed repository plus a temp dir.
pub struct Workspace {
    _dir: TempDir,
    pub root: Utf8PathBuf,
    pub checkout: Utf8PathBuf,
    pub temp: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let checkout = root.join("repo");
        let temp = root.join("tmp");
        fs::create_dir_all(&checkout).unwrap();
        Self {
            _dir: dir,
            root,
            checkout,
            temp,
        }
    }

    /// Writes `name` under the analyzed repository, creating parents.
    pub fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.checkout.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn options(
        &self,
        languages: Option<&str>,
        queries: Option<&str>,
        config_file: Option<&str>,
    ) -> InitOptions {
        InitOptions {
            languages: languages.map(str::to_string),
            queries: queries.map(str::to_string),
            config_file: config_file.map(str::to_string),
            repository: RepositoryNwo::new("octo", "app"),
            checkout_path: self.checkout.clone(),
            temp_dir: self.temp.clone(),
            tool_cache_dir: self.root.join("tools"),
        }
    }

    pub fn persisted_config_exists(&self) -> bool {
        self.temp.join("config").exists()
    }
}
