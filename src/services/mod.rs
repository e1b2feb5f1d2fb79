//! Services module - configuration resolution for a code scanning run.
//!
//! # Components
//!
//! - [`init`]: [`ConfigInitializer`] composes everything below into the final
//!   [`Config`](crate::models::Config) and persists it
//! - [`languages`]: explicit language lists and repository auto-detection
//! - [`resolution`]: the [`QueryResolver`] seam and [`QueryResolutionClient`],
//!   which files resolved queries into builtin and custom buckets
//! - [`fetch`]: config files and query repositories, local or remote, with
//!   path containment checks
//! - [`path_filter`]: validation of `paths` / `paths-ignore` entries
//!
//! Real implementations of the external seams live next to them:
//! [`CodeQlResolver`] runs the resolver executable, [`GitHubApi`] talks to the
//! REST API and [`GitCheckout`] clones query repositories.
//!
//! # Usage Example
//!
//! ```ignore
//! use codescan_config::services::{CodeQlResolver, ConfigInitializer, GitCheckout, GitHubApi};
//!
//! let initializer = ConfigInitializer::new(
//!     Arc::new(CodeQlResolver::new("codeql", Duration::from_secs(300))),
//!     Arc::new(GitHubApi::new("https://api.github.com", token)?),
//!     Arc::new(GitCheckout::new("https://github.com", Duration::from_secs(300))),
//! );
//! let config = initializer.init_config(&options).await?;
//! ```

pub mod checkout;
pub mod codeql;
pub mod fetch;
pub mod github;
pub mod init;
pub mod languages;
pub mod path_filter;
pub mod resolution;

pub use checkout::GitCheckout;
pub use codeql::{CodeQlResolver, ResolverError};
pub use fetch::{RepoApi, RepoCheckout, RepoContent};
pub use github::GitHubApi;
pub use init::{ConfigInitializer, InitOptions, InitStage};
pub use languages::resolve_languages;
pub use path_filter::{normalize_path_filter, validate_path_filter};
pub use resolution::{DisabledQueries, QueryResolutionClient, QueryResolver, ResolveQueriesOutput};
