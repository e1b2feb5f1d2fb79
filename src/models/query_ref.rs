//! Classification of `uses` strings.
//!
//! A `uses` value takes exactly one of three shapes:
//!
//! - `./relative/path`: queries inside the analyzed repository
//! - `security-extended`: a builtin suite, see [`BuiltinSuite`]
//! - `owner/repo[/path]@ref`: queries inside another repository
//!
//! [`QueryReference::parse`] is the only place these shapes are told apart;
//! everything downstream matches on the variant.

use crate::error::ConfigError;
use crate::models::RepositoryNwo;
use std::fmt;

/// A named suite shipped with the analysis bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinSuite {
    SecurityExtended,
    SecurityAndQuality,
}

impl BuiltinSuite {
    pub const ALL: [BuiltinSuite; 2] = [
        BuiltinSuite::SecurityExtended,
        BuiltinSuite::SecurityAndQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinSuite::SecurityExtended => "security-extended",
            BuiltinSuite::SecurityAndQuality => "security-and-quality",
        }
    }

    pub fn from_name(name: &str) -> Option<BuiltinSuite> {
        BuiltinSuite::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for BuiltinSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queries that live in another repository at a given revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQueries {
    pub nwo: RepositoryNwo,
    /// Path inside the repository; `None` means the repository root.
    pub path: Option<String>,
    pub git_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryReference {
    /// Path relative to the root of the analyzed repository, without the `./`.
    Local(String),
    BuiltinSuite(BuiltinSuite),
    Remote(RemoteQueries),
}

impl QueryReference {
    /// Classifies a `uses` string.
    ///
    /// `config_file` only feeds the error message; `None` means the value came
    /// from the workflow input.
    pub fn parse(uses: &str, config_file: Option<&str>) -> Result<QueryReference, ConfigError> {
        let trimmed = uses.trim();
        let invalid = || ConfigError::query_uses_invalid(config_file, Some(uses));

        if trimmed.is_empty() {
            return Err(invalid());
        }

        if let Some(local) = trimmed.strip_prefix("./") {
            return Ok(QueryReference::Local(local.to_string()));
        }

        if !trimmed.contains('/') && !trimmed.contains('@') {
            return BuiltinSuite::from_name(trimmed)
                .map(QueryReference::BuiltinSuite)
                .ok_or_else(invalid);
        }

        let (locator, git_ref) = trimmed.rsplit_once('@').ok_or_else(invalid)?;
        if git_ref.trim().is_empty() {
            return Err(invalid());
        }

        let segments: Vec<&str> = locator.split('/').collect();
        if segments.len() < 2 {
            return Err(invalid());
        }
        let (owner, repo) = (segments[0].trim(), segments[1].trim());
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }

        let path = Some(segments[2..].join("/")).filter(|path| !path.is_empty());

        Ok(QueryReference::Remote(RemoteQueries {
            nwo: RepositoryNwo::new(owner, repo),
            path,
            git_ref: git_ref.to_string(),
        }))
    }
}
