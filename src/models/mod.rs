//! Data models for configuration resolution.
//!
//! - [`Language`]: the supported analysis languages and their aliases
//! - [`QueryReference`]: a classified `uses` string (local, builtin suite, remote)
//! - [`UserConfig`]: the raw declarative config file, validated field by field
//! - [`Config`]: the resolved, persisted configuration of a run
//! - [`RepositoryNwo`]: an `owner/repo` pair

pub mod config;
pub mod language;
pub mod query_ref;
pub mod repository;

pub use config::{
    Config, GitHubVersion, LanguageQueries, QueryGroup, QuerySpec, ResolvedQueries, UserConfig,
};
pub use language::Language;
pub use query_ref::{BuiltinSuite, QueryReference, RemoteQueries};
pub use repository::RepositoryNwo;
