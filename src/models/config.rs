use crate::error::{
    ConfigError, DISABLE_DEFAULT_QUERIES_PROPERTY, NAME_PROPERTY, PATHS_IGNORE_PROPERTY,
    PATHS_PROPERTY, QUERIES_PROPERTY,
};
use crate::models::Language;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml_ng::{Mapping, Value};

/// The declarative config file exactly as the user wrote it.
///
/// Nothing is trusted at parse time: each accessor checks the type of its own
/// field and reports a property error naming the file. Unknown keys are kept
/// (they are part of the original input) but never read.
///
/// Serialized as YAML text so keys and scalars JSON cannot represent (null or
/// integer keys, `.nan`) come back exactly as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserConfig(Mapping);

impl Serialize for UserConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = serde_yaml_ng::to_string(&self.0).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for UserConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        match serde_yaml_ng::from_str(&text).map_err(serde::de::Error::custom)? {
            Value::Null => Ok(UserConfig::default()),
            Value::Mapping(mapping) => Ok(UserConfig(mapping)),
            _ => Err(serde::de::Error::custom(
                "original user input must be a mapping",
            )),
        }
    }
}

/// One entry of the `queries` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub name: Option<String>,
    pub uses: String,
}

impl UserConfig {
    /// Parses config file text. An empty document is an empty config.
    pub fn from_yaml(text: &str, config_file: &str) -> anyhow::Result<UserConfig> {
        let value: Value = serde_yaml_ng::from_str(text).map_err(|e| {
            anyhow::Error::new(e)
                .context(ConfigError::ConfigFileFormatInvalid(config_file.to_string()))
        })?;

        match value {
            Value::Null => Ok(UserConfig::default()),
            Value::Mapping(mapping) => Ok(UserConfig(mapping)),
            _ => Err(ConfigError::ConfigFileFormatInvalid(config_file.to_string()).into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn raw(&self) -> &Mapping {
        &self.0
    }

    /// `name`: must be a non-empty string when present.
    pub fn name(&self, config_file: &str) -> Result<Option<&str>, ConfigError> {
        match self.0.get(NAME_PROPERTY) {
            None => Ok(None),
            Some(Value::String(name)) if !name.is_empty() => Ok(Some(name.as_str())),
            Some(_) => Err(ConfigError::name_invalid(Some(config_file))),
        }
    }

    /// `disable-default-queries`: must be a boolean when present, defaults to false.
    pub fn disable_default_queries(&self, config_file: &str) -> Result<bool, ConfigError> {
        match self.0.get(DISABLE_DEFAULT_QUERIES_PROPERTY) {
            None => Ok(false),
            Some(Value::Bool(disable)) => Ok(*disable),
            Some(_) => Err(ConfigError::disable_default_queries_invalid(Some(
                config_file,
            ))),
        }
    }

    /// `queries`: `None` when absent, otherwise every entry must carry a string `uses`.
    pub fn queries(&self, config_file: &str) -> Result<Option<Vec<QuerySpec>>, ConfigError> {
        let entries = match self.0.get(QUERIES_PROPERTY) {
            None => return Ok(None),
            Some(Value::Sequence(entries)) => entries,
            Some(_) => return Err(ConfigError::queries_invalid(Some(config_file))),
        };

        entries
            .iter()
            .map(|entry| {
                let entry = entry
                    .as_mapping()
                    .ok_or_else(|| ConfigError::queries_invalid(Some(config_file)))?;

                let uses = match entry.get("uses") {
                    Some(Value::String(uses)) => uses.clone(),
                    _ => return Err(ConfigError::query_uses_invalid(Some(config_file), None)),
                };

                let name = match entry.get("name") {
                    None => None,
                    Some(Value::String(name)) => Some(name.clone()),
                    Some(_) => return Err(ConfigError::queries_invalid(Some(config_file))),
                };

                Ok(QuerySpec { name, uses })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// `paths-ignore`: raw filters, each still to be validated.
    pub fn paths_ignore(&self, config_file: &str) -> Result<Vec<String>, ConfigError> {
        string_list(&self.0, PATHS_IGNORE_PROPERTY)
            .ok_or_else(|| ConfigError::paths_ignore_invalid(Some(config_file)))
    }

    /// `paths`: raw filters, each still to be validated.
    pub fn paths(&self, config_file: &str) -> Result<Vec<String>, ConfigError> {
        string_list(&self.0, PATHS_PROPERTY)
            .ok_or_else(|| ConfigError::paths_invalid(Some(config_file)))
    }
}

// Absent is an empty list; anything but a list of non-empty strings is None.
fn string_list(mapping: &Mapping, key: &str) -> Option<Vec<String>> {
    let Some(value) = mapping.get(key) else {
        return Some(Vec::new());
    };

    value
        .as_sequence()?
        .iter()
        .map(|item| match item {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect()
}

/// Queries for one language that share a library search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryGroup {
    pub search_path: Utf8PathBuf,
    pub queries: Vec<String>,
}

/// Resolved queries for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageQueries {
    /// Query files from the bundled suites.
    pub builtin: Vec<String>,
    /// One group per external source, in the order the sources were declared.
    pub custom: Vec<QueryGroup>,
}

impl LanguageQueries {
    pub fn is_empty(&self) -> bool {
        self.builtin.is_empty() && self.custom.iter().all(|g| g.queries.is_empty())
    }

    pub fn query_count(&self) -> usize {
        self.builtin.len() + self.custom.iter().map(|g| g.queries.len()).sum::<usize>()
    }
}

/// Accumulator for resolved queries, ordered by first appearance.
pub type ResolvedQueries = IndexMap<Language, LanguageQueries>;

/// The platform serving the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GitHubVersion {
    Dotcom,
    Ghes { version: String },
}

/// The resolved configuration of a run.
///
/// Built once by [`crate::services::init::ConfigInitializer`] and persisted by
/// [`crate::config::ConfigStore`]; later stages load this snapshot instead of
/// resolving again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub languages: Vec<Language>,
    pub queries: ResolvedQueries,
    pub paths_ignore: Vec<String>,
    pub paths: Vec<String>,
    pub original_user_input: UserConfig,
    pub temp_dir: Utf8PathBuf,
    pub tool_cache_dir: Utf8PathBuf,
    pub codeql_cmd: Utf8PathBuf,
    pub github_version: GitHubVersion,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "codescan.yml";

    fn parse(text: &str) -> UserConfig {
        UserConfig::from_yaml(text, FILE).unwrap()
    }

    #[test]
    fn test_empty_document_is_empty_config() {
        let config = parse("");
        assert!(config.is_empty());
        assert_eq!(config.name(FILE).unwrap(), None);
        assert!(!config.disable_default_queries(FILE).unwrap());
        assert_eq!(config.queries(FILE).unwrap(), None);
        assert!(config.paths(FILE).unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_document_is_rejected() {
        let err = UserConfig::from_yaml("- a\n- b\n", FILE).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ConfigFileFormatInvalid(FILE.to_string()))
        );
    }

    #[test]
    fn test_syntax_error_is_format_invalid() {
        let err = UserConfig::from_yaml("name: [unterminated", FILE).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ConfigFileFormatInvalid(_))
        ));
    }

    #[test]
    fn test_all_fields() {
        let config = parse(
            r#"
name: my config
disable-default-queries: true
queries:
  - name: extended
    uses: security-extended
  - uses: ./queries
paths-ignore:
  - node_modules
paths:
  - src
unknown-field: 42
"#,
        );

        assert_eq!(config.name(FILE).unwrap(), Some("my config"));
        assert!(config.disable_default_queries(FILE).unwrap());
        assert_eq!(
            config.queries(FILE).unwrap().unwrap(),
            vec![
                QuerySpec {
                    name: Some("extended".into()),
                    uses: "security-extended".into()
                },
                QuerySpec {
                    name: None,
                    uses: "./queries".into()
                },
            ]
        );
        assert_eq!(config.paths_ignore(FILE).unwrap(), vec!["node_modules"]);
        assert_eq!(config.paths(FILE).unwrap(), vec!["src"]);
    }

    #[test]
    fn test_type_mismatches_are_fatal() {
        assert!(parse("name: 12").name(FILE).is_err());
        assert!(parse("name: ''").name(FILE).is_err());
        assert!(parse("disable-default-queries: yes please").disable_default_queries(FILE).is_err());
        assert!(parse("queries: security-extended").queries(FILE).is_err());
        assert!(parse("queries:\n  - name: x").queries(FILE).is_err());
        assert!(parse("queries:\n  - uses: 3").queries(FILE).is_err());
        assert!(parse("paths: src").paths(FILE).is_err());
        assert!(parse("paths:\n  - ''").paths(FILE).is_err());
        assert!(parse("paths-ignore:\n  - 1").paths_ignore(FILE).is_err());
    }

    #[test]
    fn test_query_count() {
        let queries = LanguageQueries {
            builtin: vec!["a.ql".into()],
            custom: vec![QueryGroup {
                search_path: Utf8PathBuf::from("/tmp/x"),
                queries: vec!["b.ql".into(), "c.ql".into()],
            }],
        };
        assert_eq!(queries.query_count(), 3);
        assert!(!queries.is_empty());
        assert!(LanguageQueries::default().is_empty());
    }
}
