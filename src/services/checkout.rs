use crate::error::ConfigError;
use crate::models::RepositoryNwo;
use crate::services::fetch::{RepoCheckout, normalize_lexically};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// [`RepoCheckout`] using the `git` executable.
///
/// Checkouts live at `<temp_dir>/<owner>/<repo>/<ref>` and are reused when
/// the same reference is requested twice in one run.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    server_url: String,
    timeout: Duration,
}

impl GitCheckout {
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Where `repository` at `git_ref` is checked out.
    ///
    /// Owner, repo and ref come from user input, so the location is rejected
    /// unless it stays strictly below `temp_dir`.
    pub fn checkout_location(
        repository: &RepositoryNwo,
        git_ref: &str,
        temp_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, ConfigError> {
        let temp_dir = normalize_lexically(temp_dir);
        let location = normalize_lexically(
            &temp_dir
                .join(&repository.owner)
                .join(&repository.repo)
                .join(git_ref),
        );

        if location == temp_dir || !location.starts_with(&temp_dir) {
            return Err(ConfigError::CheckoutOutsideTempDir {
                location: location.to_string(),
                temp_dir: temp_dir.to_string(),
            });
        }
        Ok(location)
    }

    /// Runs `git <subcommand> <args>`, against `repo_dir` when given.
    async fn git(
        &self,
        repo_dir: Option<&Utf8Path>,
        subcommand: &str,
        args: &[&str],
    ) -> Result<()> {
        let mut command = Command::new("git");
        if let Some(dir) = repo_dir {
            command
                .arg(format!("--work-tree={}", dir))
                .arg(format!("--git-dir={}", dir.join(".git")));
        }
        command.arg(subcommand).args(args);

        tracing::debug!("Executing: git {} {}", subcommand, args.join(" "));
        let start = Instant::now();

        let child = command
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to spawn git")?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("git {} timed out after {:?}", subcommand, self.timeout))?
            .with_context(|| format!("Failed to wait for git {}", subcommand))?;

        tracing::debug!(
            "git {} finished in {:.2}s",
            subcommand,
            start.elapsed().as_secs_f32()
        );

        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                subcommand,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    /// Clones into `scratch` and checks out `git_ref` there.
    async fn clone_at(
        &self,
        repository: &RepositoryNwo,
        git_ref: &str,
        scratch: &Utf8Path,
    ) -> Result<()> {
        let url = format!("{}/{}", self.server_url, repository);
        self.git(None, "clone", &[&url, scratch.as_str()]).await?;
        self.git(Some(scratch), "checkout", &[git_ref]).await
    }
}

#[async_trait]
impl RepoCheckout for GitCheckout {
    async fn checkout(
        &self,
        repository: &RepositoryNwo,
        git_ref: &str,
        temp_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf> {
        let location = Self::checkout_location(repository, git_ref, temp_dir)?;

        if location.join(".git").exists() {
            tracing::debug!("Reusing checkout of {}@{} at {}", repository, git_ref, location);
            return Ok(location);
        }

        tracing::info!("Checking out {}@{} into {}", repository, git_ref, location);

        // only a fully checked out tree is ever moved to `location`
        let scratch = Utf8PathBuf::from(format!("{}.partial", location));
        if scratch.exists() {
            tokio::fs::remove_dir_all(&scratch)
                .await
                .with_context(|| format!("Failed to remove stale checkout {}", scratch))?;
        }

        if let Err(e) = self.clone_at(repository, git_ref, &scratch).await {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&scratch).await {
                tracing::debug!("Could not remove {}: {}", scratch, cleanup);
            }
            return Err(e);
        }

        if location.exists() {
            tokio::fs::remove_dir_all(&location)
                .await
                .with_context(|| format!("Failed to remove stale checkout {}", location))?;
        }
        tokio::fs::rename(&scratch, &location)
            .await
            .with_context(|| format!("Failed to move checkout into {}", location))?;

        Ok(location)
    }
}
