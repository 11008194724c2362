//! Per-invocation state shared between the executor and environment composition.

use crate::Config;
use std::path::PathBuf;

/// Milliseconds spent in each phase of a tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timings {
    pub find_tool_ms: u64,
    pub env_setup_ms: u64,
    pub execution_ms: u64,
}

impl Timings {
    pub fn total_ms(&self) -> u64 {
        self.find_tool_ms + self.env_setup_ms + self.execution_ms
    }
}

/// Everything known about one launcher invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunContext {
    /// Absolute, symlink-resolved project root.
    pub root: PathBuf,
    /// Absolute path to the launcher binary.
    pub bin_path: PathBuf,
    pub verbose: bool,
    /// Requested tool name.
    pub command: String,
    /// Arguments after the tool name.
    pub remaining_args: Vec<String>,
    /// Raw global flags that preceded the tool name.
    pub global_command_args: String,
    pub config: Config,
    /// Filled in by the executor during a run.
    pub timings: Timings,
    /// Search path entry the tool was found under, once resolved.
    pub found_tool_path: Option<String>,
}

impl RunContext {
    pub fn new(root: PathBuf, bin_path: PathBuf, config: Config) -> Self {
        Self {
            root,
            bin_path,
            config,
            ..Default::default()
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>, remaining_args: Vec<String>) -> Self {
        self.command = command.into();
        self.remaining_args = remaining_args;
        self
    }

    pub fn with_global_command_args(mut self, global_command_args: impl Into<String>) -> Self {
        self.global_command_args = global_command_args.into();
        self
    }
}
