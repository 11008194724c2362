//! Subprocess execution.

use crate::{Error, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// How a subprocess's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Share stdin, stdout, and stderr with the launcher.
    Inherit,
    /// Share stdin and stderr, capture stdout.
    CaptureStdout,
    /// No stdin, capture stdout and stderr.
    CaptureAll,
}

/// A subprocess to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Complete environment as `KEY=VALUE` entries; later duplicates win.
    pub env: Vec<String>,
    pub output: OutputMode,
}

/// Exit code and captured output of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait describing how subprocesses are started.
pub trait CommandRunner {
    /// Run `spec` to completion. Only a failure to start is an error;
    /// a non-zero exit is reported through [`CommandOutput::code`].
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs subprocesses with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).env_clear();
        for entry in &spec.env {
            if let Some((key, value)) = entry.split_once('=') {
                cmd.env(key, value);
            }
        }

        let spawn_err = |source| Error::Spawn {
            program: spec.program.clone(),
            source,
        };

        match spec.output {
            OutputMode::Inherit => {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(spawn_err)?;
                Ok(CommandOutput {
                    code: status.code(),
                    ..Default::default()
                })
            }
            OutputMode::CaptureStdout | OutputMode::CaptureAll => {
                if spec.output == OutputMode::CaptureStdout {
                    cmd.stdin(Stdio::inherit()).stderr(Stdio::inherit());
                } else {
                    cmd.stdin(Stdio::null()).stderr(Stdio::piped());
                }
                let output = cmd.stdout(Stdio::piped()).output().map_err(spawn_err)?;
                Ok(CommandOutput {
                    code: output.status.code(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
        }
    }
}
