//! Build metadata passed explicitly into the tool server.

use serde::{Deserialize, Serialize};

/// Version information for the running binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Semantic version of the release
    pub version: String,

    /// Commit the binary was built from, when known
    #[serde(default)]
    pub git_commit: Option<String>,

    /// Build date, when known
    #[serde(default)]
    pub build_date: Option<String>,
}

impl BuildInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            git_commit: None,
            build_date: None,
        }
    }

    pub fn with_git_commit(mut self, commit: Option<impl Into<String>>) -> Self {
        self.git_commit = commit.map(Into::into);
        self
    }

    pub fn with_build_date(mut self, date: Option<impl Into<String>>) -> Self {
        self.build_date = date.map(Into::into);
        self
    }

    /// Single-line description, e.g. `0.3.0 (abc1234, 2025-03-01)`.
    pub fn long_version(&self) -> String {
        let extras: Vec<&str> = [self.git_commit.as_deref(), self.build_date.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if extras.is_empty() {
            self.version.clone()
        } else {
            format!("{} ({})", self.version, extras.join(", "))
        }
    }
}
