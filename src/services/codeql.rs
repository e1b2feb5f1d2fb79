use crate::services::resolution::{QueryResolver, ResolveQueriesOutput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Errors from running the resolver executable
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Resolver exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("Resolver produced invalid output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

/// [`QueryResolver`] backed by the `codeql` CLI.
///
/// Runs `codeql resolve queries <queries...> --format=bylanguage`, adding
/// `--search-path <dir>` for custom queries, and parses the JSON it prints.
#[derive(Debug, Clone)]
pub struct CodeQlResolver {
    cmd: Utf8PathBuf,
    timeout: Duration,
}

impl CodeQlResolver {
    pub fn new(cmd: impl Into<Utf8PathBuf>, timeout: Duration) -> Self {
        Self {
            cmd: cmd.into(),
            timeout,
        }
    }

    /// Arguments for one `resolve queries` invocation.
    pub fn build_args(queries: &[String], search_path: Option<&Utf8Path>) -> Vec<String> {
        let mut args = vec!["resolve".to_string(), "queries".to_string()];
        args.extend(queries.iter().cloned());
        args.push("--format=bylanguage".to_string());
        if let Some(search_path) = search_path {
            args.push("--search-path".to_string());
            args.push(search_path.to_string());
        }
        args
    }
}

#[async_trait]
impl QueryResolver for CodeQlResolver {
    async fn resolve_queries(
        &self,
        queries: Vec<String>,
        search_path: Option<Utf8PathBuf>,
    ) -> Result<ResolveQueriesOutput> {
        let args = Self::build_args(&queries, search_path.as_deref());
        tracing::info!("Executing: {} {}", self.cmd, args.join(" "));

        let start = Instant::now();

        let child = Command::new(self.cmd.as_std_path())
            .args(&args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.cmd))?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::warn!("Query resolution timed out after {:?}", self.timeout);
                ResolverError::Timeout(self.timeout)
            })?
            .with_context(|| format!("Failed to wait for {}", self.cmd))?;

        tracing::debug!(
            "Query resolution completed in {:.2}s with status {}",
            start.elapsed().as_secs_f32(),
            output.status
        );

        if !output.status.success() {
            return Err(ResolverError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let parsed: ResolveQueriesOutput =
            serde_json::from_slice(&output.stdout).map_err(ResolverError::from)?;
        Ok(parsed)
    }

    fn command_path(&self) -> Utf8PathBuf {
        self.cmd.clone()
    }
}
