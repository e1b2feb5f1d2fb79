use crate::models::{GitHubVersion, RepositoryNwo};
use crate::services::fetch::{RepoApi, RepoContent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, USER_AGENT};
use serde_json::Value;

const ENTERPRISE_VERSION_HEADER: &str = "x-github-enterprise-version";

/// [`RepoApi`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubApi {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .header(USER_AGENT, concat!("codescan-config/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json");

        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }
}

/// Content API answers with a list for directories and an object for files.
fn parse_content(body: Value) -> RepoContent {
    match body {
        Value::Array(_) => RepoContent::Directory,
        Value::Object(ref object) if object.get("type").and_then(Value::as_str) == Some("dir") => {
            RepoContent::Directory
        }
        body => RepoContent::File {
            content: body
                .get("content")
                .and_then(Value::as_str)
                .filter(|content| !content.is_empty())
                .map(str::to_string),
        },
    }
}

fn version_from_headers(headers: &HeaderMap) -> GitHubVersion {
    match headers
        .get(ENTERPRISE_VERSION_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(version) => GitHubVersion::Ghes {
            version: version.to_string(),
        },
        None => GitHubVersion::Dotcom,
    }
}

#[async_trait]
impl RepoApi for GitHubApi {
    async fn list_languages(&self, repository: &RepositoryNwo) -> Result<IndexMap<String, u64>> {
        tracing::debug!("Listing languages of {}", repository);

        let languages = self
            .get(&format!("/repos/{}/languages", repository))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("Failed to list languages of {}", repository))?
            .json::<IndexMap<String, u64>>()
            .await
            .context("Invalid languages response")?;

        Ok(languages)
    }

    async fn get_content(
        &self,
        repository: &RepositoryNwo,
        path: &str,
        git_ref: &str,
    ) -> Result<RepoContent> {
        tracing::debug!("Fetching {}/{}@{}", repository, path, git_ref);

        let body = self
            .get(&format!("/repos/{}/contents/{}", repository, path))
            .query(&[("ref", git_ref)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("Failed to fetch {}/{}@{}", repository, path, git_ref))?
            .json::<Value>()
            .await
            .context("Invalid content response")?;

        Ok(parse_content(body))
    }

    async fn platform_version(&self) -> Result<GitHubVersion> {
        let response = self
            .get("/")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context("Failed to query platform version")?;

        let version = version_from_headers(response.headers());
        tracing::debug!("Platform version: {:?}", version);
        Ok(version)
    }
}
