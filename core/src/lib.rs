//! Core crate for the `uber` project-local tool launcher.

pub mod args;
pub mod config;
pub mod context;
pub mod env;
pub mod executor;
pub mod registry;
pub mod root;
pub mod runner;

pub use args::{split_args, SplitArgs};
pub use config::Config;
pub use context::{RunContext, Timings};
pub use executor::ToolExecutor;
pub use registry::{AvailableTool, ResolvedTool, ToolMatch};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, OutputMode, SystemRunner};

use std::path::PathBuf;
use thiserror::Error;

/// Name of the marker file that anchors a project root.
pub const MARKER_FILE: &str = ".uber";

/// Errors produced while locating, preparing, or running a tool.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse .uber file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to get current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("no .uber file found in current directory or any parent directories")]
    ProjectRootNotFound,

    #[error("specified root directory does not exist: {}", .0.display())]
    RootMissing(PathBuf),

    #[error("specified root directory does not contain a .uber file")]
    RootWithoutMarker(PathBuf),

    #[error("missing required positional argument 'command'")]
    MissingCommand,

    #[error("--list-tools does not take a command, got '{0}'")]
    UnexpectedCommand(String),

    #[error("no tool paths configured in .uber file")]
    NoToolPaths,

    #[error("tool path '{0}' does not exist")]
    ToolPathMissing(String),

    #[error("tool '{name}' not found in any configured tool path{}", did_you_mean(.suggestions))]
    ToolNotFound { name: String, suggestions: Vec<String> },

    #[error(
        "ambiguous tool name '{name}' in '{search_path}'. Found multiple files: {}. Please specify the extension (e.g., '{}')",
        describe_candidates(.candidates),
        example_name(.candidates, .name)
    )]
    AmbiguousTool {
        name: String,
        search_path: String,
        candidates: Vec<String>,
    },

    #[error("env setup script '{}' not found", .0.display())]
    EnvSetupMissing(PathBuf),

    #[error("env setup script '{}' is not executable", .0.display())]
    EnvSetupNotExecutable(PathBuf),

    #[error("env setup script '{}' exited with {}", .path.display(), describe_code(.code))]
    EnvSetupFailed { path: PathBuf, code: Option<i32> },

    #[error("env setup script '{}' printed output that is not valid UTF-8", .0.display())]
    EnvSetupOutput(PathBuf),

    #[error("reporting command '{}' not found", .0.display())]
    ReportingMissing(PathBuf),

    #[error("reporting command '{}' is not executable", .0.display())]
    ReportingNotExecutable(PathBuf),

    #[error("reporting command '{}' exited with {}", .path.display(), describe_code(.code))]
    ReportingFailed { path: PathBuf, code: Option<i32> },

    #[error("failed to start '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tool '{}' exited with {}", .path.display(), describe_code(.code))]
    ToolFailed { path: PathBuf, code: Option<i32> },
}

impl Error {
    /// Process exit status to report for this error.
    ///
    /// A tool that exits non-zero hands its own code through; everything else is `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolFailed { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Convenient alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean: {}?", suggestions.join(", "))
    }
}

fn describe_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|name| match registry::extension_of(name) {
            Some(ext) => format!("{name} ({ext})"),
            None => name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn example_name<'a>(candidates: &'a [String], name: &'a str) -> &'a str {
    candidates.first().map(String::as_str).unwrap_or(name)
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "no exit status (terminated by signal)".to_string(),
    }
}
