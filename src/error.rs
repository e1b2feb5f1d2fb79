//! Error taxonomy for configuration resolution.
//!
//! Every diagnosable failure is a [`ConfigError`] variant. Functions that do I/O
//! return `anyhow::Result` and raise these values through `?`, so callers can
//! recover the variant with `err.downcast_ref::<ConfigError>()`.

use crate::models::Language;
use thiserror::Error;

pub const NAME_PROPERTY: &str = "name";
pub const DISABLE_DEFAULT_QUERIES_PROPERTY: &str = "disable-default-queries";
pub const QUERIES_PROPERTY: &str = "queries";
pub const QUERIES_USES_PROPERTY: &str = "queries.uses";
pub const PATHS_IGNORE_PROPERTY: &str = "paths-ignore";
pub const PATHS_PROPERTY: &str = "paths";

/// Broad category of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed field, invalid reference, unknown language, empty query set.
    UserConfig,
    /// A path escapes the trusted checkout, or a local file is absent.
    TrustBoundary,
    /// Resolver, checkout or API returned something unusable.
    ExternalService,
    /// Custom queries that declare no language or several.
    AmbiguousQuery,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{}", property_message(.config_file.as_deref(), .property, .detail))]
    InvalidProperty {
        config_file: Option<String>,
        property: String,
        detail: String,
    },

    #[error(
        "Did not detect any languages to analyze. Please update input in workflow or check that \
         GitHub detects the correct languages in your repo."
    )]
    NoLanguages,

    #[error("Did not recognise the following languages: {}", .0.join(", "))]
    UnknownLanguages(Vec<String>),

    #[error(
        "Did not detect any queries to run for {0}. Please make sure that the default queries \
         are enabled, or you are specifying queries to run."
    )]
    NoQueries(Language),

    #[error("{}", local_path_message(.config_file.as_deref(), .path, "is outside of the repository"))]
    PathOutsideRepository {
        config_file: Option<String>,
        path: String,
    },

    #[error("{}", local_path_message(.config_file.as_deref(), .path, "does not exist in the repository"))]
    PathDoesNotExist {
        config_file: Option<String>,
        path: String,
    },

    #[error("The configuration file \"{0}\" is outside of the workspace")]
    ConfigFileOutsideWorkspace(String),

    #[error("The configuration file \"{0}\" does not exist")]
    ConfigFileDoesNotExist(String),

    #[error(
        "The configuration file \"{0}\" is not a supported remote file reference. Expected format \
         <owner>/<repository>/<file-path>@<ref>"
    )]
    ConfigFileRepoFormatInvalid(String),

    #[error("The configuration file \"{0}\" could not be read")]
    ConfigFileFormatInvalid(String),

    #[error("The configuration file \"{0}\" looks like a directory, not a file")]
    ConfigFileDirectoryGiven(String),

    #[error("Checkout location \"{location}\" is not within \"{temp_dir}\"")]
    CheckoutOutsideTempDir { location: String, temp_dir: String },

    #[error(
        "The following queries do not declare a language. Their qlpack.yml files are either \
         missing or is invalid.\n{}",
        .0.join("\n")
    )]
    NoDeclaredLanguage(Vec<String>),

    #[error(
        "The following queries declare multiple languages. Their qlpack.yml files are either \
         missing or is invalid.\n{}",
        .0.join("\n")
    )]
    MultipleDeclaredLanguages(Vec<String>),
}

impl ConfigError {
    /// Error for a property of the config file, or of the workflow when `config_file` is `None`.
    pub fn property(
        config_file: Option<&str>,
        property: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::InvalidProperty {
            config_file: config_file.map(str::to_string),
            property: property.into(),
            detail: detail.into(),
        }
    }

    pub fn name_invalid(config_file: Option<&str>) -> Self {
        Self::property(config_file, NAME_PROPERTY, "must be a non-empty string")
    }

    pub fn disable_default_queries_invalid(config_file: Option<&str>) -> Self {
        Self::property(
            config_file,
            DISABLE_DEFAULT_QUERIES_PROPERTY,
            "must be a boolean",
        )
    }

    pub fn queries_invalid(config_file: Option<&str>) -> Self {
        Self::property(
            config_file,
            QUERIES_PROPERTY,
            "must be an array of objects with a \"uses\" string",
        )
    }

    pub fn query_uses_invalid(config_file: Option<&str>, uses: Option<&str>) -> Self {
        let mut detail = String::from(
            "must be a built-in suite (security-extended or security-and-quality), a relative \
             path, or be of the form \"owner/repo[/path]@ref\"",
        );
        if let Some(uses) = uses {
            detail.push_str(&format!("\n Found: {}", uses));
        }
        Self::property(config_file, QUERIES_USES_PROPERTY, detail)
    }

    pub fn paths_ignore_invalid(config_file: Option<&str>) -> Self {
        Self::property(
            config_file,
            PATHS_IGNORE_PROPERTY,
            "must be an array of non empty strings",
        )
    }

    pub fn paths_invalid(config_file: Option<&str>) -> Self {
        Self::property(
            config_file,
            PATHS_PROPERTY,
            "must be an array of non empty strings",
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidProperty { .. }
            | Self::NoLanguages
            | Self::UnknownLanguages(_)
            | Self::NoQueries(_)
            | Self::ConfigFileRepoFormatInvalid(_) => ErrorKind::UserConfig,
            Self::PathOutsideRepository { .. }
            | Self::PathDoesNotExist { .. }
            | Self::ConfigFileOutsideWorkspace(_)
            | Self::ConfigFileDoesNotExist(_)
            | Self::CheckoutOutsideTempDir { .. } => ErrorKind::TrustBoundary,
            Self::ConfigFileFormatInvalid(_) | Self::ConfigFileDirectoryGiven(_) => {
                ErrorKind::ExternalService
            }
            Self::NoDeclaredLanguage(_) | Self::MultipleDeclaredLanguages(_) => {
                ErrorKind::AmbiguousQuery
            }
        }
    }
}

fn property_message(config_file: Option<&str>, property: &str, detail: &str) -> String {
    match config_file {
        Some(file) => format!(
            "The configuration file \"{}\" is invalid: property \"{}\" {}",
            file, property, detail
        ),
        None => format!(
            "The workflow property \"{}\" is invalid: {}",
            property, detail
        ),
    }
}

fn local_path_message(config_file: Option<&str>, path: &str, problem: &str) -> String {
    property_message(
        config_file,
        QUERIES_USES_PROPERTY,
        &format!("is invalid as the local path \"{}\" {}", path, problem),
    )
}
