//! Validation and normalization of `paths` / `paths-ignore` filters.

use crate::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

/// A `**` that touches anything other than `/` or the ends of the string.
static INVALID_DOUBLE_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*[^/]\*\*|\*\*[^/].*").expect("Invalid ** regex"));

const LITERAL_ONLY_CHARACTERS: [char; 5] = ['?', '+', '[', ']', '!'];

/// Drops trailing `/**` segments, then leading slashes.
///
/// `/foo/**` becomes `foo` and `/**` becomes empty. The result never ends in
/// `/**` and never starts with `/`, so normalizing twice changes nothing.
pub fn normalize_path_filter(path: &str) -> String {
    let mut path = path;
    while let Some(stripped) = path.strip_suffix("/**") {
        path = stripped;
    }
    path.trim_start_matches('/').to_string()
}

/// Validates one path filter and returns its normalized form.
///
/// `property` is `paths` or `paths-ignore`. Characters that other filter
/// grammars treat specially (`? + [ ] !`) only produce a warning: they are
/// matched literally.
pub fn validate_path_filter(
    original: &str,
    property: &str,
    config_file: Option<&str>,
) -> Result<String, ConfigError> {
    let path = normalize_path_filter(original);

    if path.is_empty() {
        return Err(ConfigError::property(
            config_file,
            property,
            format!(
                "\"{}\" is not an invalid path. It is not necessary to include it, and it is \
                 not allowed to exclude it.",
                original
            ),
        ));
    }

    if INVALID_DOUBLE_STAR.is_match(&path) {
        return Err(ConfigError::property(
            config_file,
            property,
            format!(
                "\"{}\" contains an invalid \"**\" wildcard. They must be immediately preceded \
                 and followed by a slash as in \"/**/\", or come at the start or end.",
                original
            ),
        ));
    }

    if path.contains(LITERAL_ONLY_CHARACTERS) {
        tracing::warn!(
            "{}",
            ConfigError::property(
                config_file,
                property,
                format!(
                    "\"{}\" contains an unsupported character. The filter pattern characters \
                     ?, +, [, ], ! are not supported and will be matched literally.",
                    original
                ),
            )
        );
    }

    if path.contains('\\') {
        return Err(ConfigError::property(
            config_file,
            property,
            format!(
                "\"{}\" contains an \"\\\" character. These are not allowed in filters. If \
                 running on windows we recommend using \"/\" instead for path filters.",
                original
            ),
        ));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` with a subscriber capturing log output, returning that output.
    fn capture_logs(f: impl FnOnce()) -> String {
        let writer = CapturedWriter::default();
        let make_writer = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || make_writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = writer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn validate(path: &str) -> Result<String, ConfigError> {
        validate_path_filter(path, "paths", Some("codescan.yml"))
    }

    #[test]
    fn test_plain_paths_pass_through() {
        assert_eq!(validate("src").unwrap(), "src");
        assert_eq!(validate("src/lib/*.js").unwrap(), "src/lib/*.js");
    }

    #[test]
    fn test_leading_slashes_and_trailing_double_star() {
        assert_eq!(validate("/foo/**").unwrap(), "foo");
        assert_eq!(validate("foo/**/**").unwrap(), "foo");
        assert_eq!(validate("///foo").unwrap(), "foo");
        assert_eq!(validate("**").unwrap(), "**");
        assert_eq!(validate("**/foo").unwrap(), "**/foo");
    }

    #[test]
    fn test_root_only_patterns_are_rejected() {
        let err = validate("/**").unwrap_err();
        assert!(err.to_string().contains("is not an invalid path"));
        assert!(validate("/").is_err());
        assert!(validate("//**/**").is_err());
        assert!(validate("").is_err());
    }

    #[test]
    fn test_double_star_adjacency() {
        assert_eq!(validate("foo/**/bar").unwrap(), "foo/**/bar");
        let err = validate("foo/**bar").unwrap_err();
        assert!(err.to_string().contains("invalid \"**\" wildcard"));
        assert!(validate("foo**/bar").is_err());
        assert!(validate("**foo").is_err());
    }

    #[test]
    fn test_backslash_is_rejected() {
        let err = validate("foo\\bar").unwrap_err();
        assert!(err.to_string().contains("recommend using \"/\""));
    }

    #[test]
    fn test_literal_characters_only_warn() {
        assert_eq!(validate("foo?").unwrap(), "foo?");
        assert_eq!(validate("[ab]!").unwrap(), "[ab]!");
    }

    #[test]
    fn test_literal_characters_emit_warning() {
        let logs = capture_logs(|| {
            assert_eq!(validate("foo?").unwrap(), "foo?");
        });
        assert!(logs.contains("WARN"), "{}", logs);
        assert!(logs.contains("unsupported character"), "{}", logs);
        assert!(logs.contains("foo?"), "{}", logs);

        let logs = capture_logs(|| {
            assert_eq!(validate("src").unwrap(), "src");
        });
        assert!(logs.is_empty(), "{}", logs);
    }

    #[test]
    fn test_error_names_property() {
        let err = validate_path_filter("/**", "paths-ignore", Some("codescan.yml")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidProperty { ref property, .. } if property == "paths-ignore"
        ));
    }
}
