use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name-with-owner of a repository, e.g. `octo-org/queries`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryNwo {
    pub owner: String,
    pub repo: String,
}

impl RepositoryNwo {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepositoryNwo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepositoryNwo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => anyhow::bail!("Invalid repository \"{}\", expected owner/repo", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let nwo: RepositoryNwo = "octo-org/queries".parse().unwrap();
        assert_eq!(nwo.owner, "octo-org");
        assert_eq!(nwo.repo, "queries");
        assert_eq!(nwo.to_string(), "octo-org/queries");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("octo-org".parse::<RepositoryNwo>().is_err());
        assert!("/queries".parse::<RepositoryNwo>().is_err());
        assert!("a/b/c".parse::<RepositoryNwo>().is_err());
    }
}
