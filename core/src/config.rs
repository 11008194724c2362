//! Configuration model and loader for the `.uber` project file.

use crate::{Error, Result, MARKER_FILE};
use std::path::Path;

/// Project configuration read from the `.uber` file at the project root.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories searched for tools, in priority order.
    pub tool_paths: Vec<String>,
    /// Script run before every tool to contribute `KEY=VALUE` environment lines.
    pub env_setup: Option<String>,
    /// Command run after a successful tool invocation with timing data.
    pub reporting_cmd: Option<String>,
}

impl Config {
    /// Parse configuration from TOML text.
    ///
    /// Expected TOML keys:
    /// - `tool_paths` as an array of absolute or root-relative directories
    /// - `env_setup` as a script path
    /// - `reporting_cmd` as a command path
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load the `.uber` file from `project_root`.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self> {
        let path = project_root.as_ref().join(MARKER_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| Error::Io { path, source })?;
        Self::parse(&text)
    }

    /// Configured env setup script, treating an empty string as unset.
    pub fn env_setup(&self) -> Option<&str> {
        self.env_setup.as_deref().filter(|s| !s.is_empty())
    }

    /// Configured reporting command, treating an empty string as unset.
    pub fn reporting_cmd(&self) -> Option<&str> {
        self.reporting_cmd.as_deref().filter(|s| !s.is_empty())
    }
}
