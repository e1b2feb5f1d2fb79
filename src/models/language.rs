use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language the analysis can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Csharp,
    Go,
    Java,
    Javascript,
    Python,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Cpp,
        Language::Csharp,
        Language::Go,
        Language::Java,
        Language::Javascript,
        Language::Python,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Csharp => "csharp",
            Language::Go => "go",
            Language::Java => "java",
            Language::Javascript => "javascript",
            Language::Python => "python",
        }
    }

    /// Parses a language name or one of its aliases, ignoring case.
    ///
    /// Returns `None` for anything unsupported; callers decide whether that is
    /// an error (explicit input) or noise (repository statistics).
    pub fn parse(name: &str) -> Option<Language> {
        let name = name.trim().to_lowercase();

        if let Some(language) = Language::ALL.iter().find(|l| l.as_str() == name) {
            return Some(*language);
        }

        match name.as_str() {
            "c" | "c++" => Some(Language::Cpp),
            "c#" => Some(Language::Csharp),
            "typescript" => Some(Language::Javascript),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        for language in Language::ALL {
            assert_eq!(Language::parse(language.as_str()), Some(language));
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Language::parse("C"), Some(Language::Cpp));
        assert_eq!(Language::parse("C++"), Some(Language::Cpp));
        assert_eq!(Language::parse("C#"), Some(Language::Csharp));
        assert_eq!(Language::parse("TypeScript"), Some(Language::Javascript));
        assert_eq!(Language::parse(" Python "), Some(Language::Python));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Language::parse("rust"), None);
        assert_eq!(Language::parse(""), None);
        assert!("HTML".parse::<Language>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_identifier() {
        let json = serde_json::to_string(&Language::Csharp).unwrap();
        assert_eq!(json, "\"csharp\"");
        let back: Language = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Language::Csharp);
    }
}
