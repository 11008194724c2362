//! Finding and running a tool, with the optional env setup and reporting steps.

use crate::env;
use crate::registry::{self, AvailableTool, ResolvedTool};
use crate::runner::{CommandRunner, CommandSpec, OutputMode, SystemRunner};
use crate::{Error, Result, RunContext};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs tools for one invocation.
///
/// A run goes resolve, env setup (if configured), execute, then reporting (if
/// configured and the tool succeeded). Reporting failures are logged and never
/// change the outcome.
pub struct ToolExecutor<R = SystemRunner> {
    ctx: RunContext,
    runner: R,
    inherited: Vec<(String, String)>,
}

impl ToolExecutor<SystemRunner> {
    /// Executor that spawns real processes with the launcher's own environment.
    pub fn new(ctx: RunContext) -> Self {
        Self::with_runner(ctx, SystemRunner::new(), env::inherited())
    }
}

impl<R: CommandRunner> ToolExecutor<R> {
    pub fn with_runner(ctx: RunContext, runner: R, inherited: Vec<(String, String)>) -> Self {
        Self {
            ctx,
            runner,
            inherited,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// All executables under the configured tool paths.
    pub fn available_tools(&self) -> Result<Vec<AvailableTool>> {
        registry::all_available_tools(&self.ctx.root, &self.ctx.config.tool_paths)
    }

    /// Resolve `tool_name` without running it.
    pub fn resolve(&self, tool_name: &str) -> Result<ResolvedTool> {
        registry::resolve(&self.ctx.root, &self.ctx.config.tool_paths, tool_name)
    }

    /// Find `tool_name` in the tool paths and run it with `args`.
    pub fn find_and_execute(&mut self, tool_name: &str, args: &[String]) -> Result<()> {
        let started = Instant::now();
        let tool = self.resolve(tool_name)?;
        self.ctx.timings.find_tool_ms = elapsed_ms(started);
        self.ctx.found_tool_path = Some(tool.search_path.clone());
        info!(
            "Found tool '{tool_name}' (resolved to '{}') in path '{}'",
            tool.name, tool.search_path
        );

        let started = Instant::now();
        let env = match self.run_env_setup()? {
            Some(env) => env,
            None => self.base_environment(),
        };
        self.ctx.timings.env_setup_ms = elapsed_ms(started);

        let started = Instant::now();
        let result = self.execute_tool(&tool.full_path, args, env);
        self.ctx.timings.execution_ms = elapsed_ms(started);
        result?;

        if let Err(err) = self.run_reporting() {
            warn!("Reporting command failed: {err}");
        }
        Ok(())
    }

    /// Environment every subprocess starts from.
    pub fn base_environment(&self) -> Vec<String> {
        env::base_environment(&self.ctx, self.inherited.iter().cloned())
    }

    /// Run the configured env setup script and merge its output into the base
    /// environment. `None` when no script is configured.
    fn run_env_setup(&self) -> Result<Option<Vec<String>>> {
        let Some(script) = self.ctx.config.env_setup() else {
            return Ok(None);
        };
        let path = self.project_path(script);
        if !path.exists() {
            return Err(Error::EnvSetupMissing(path));
        }
        if !registry::is_executable(&path) {
            return Err(Error::EnvSetupNotExecutable(path));
        }

        info!("Executing env setup script: {}", path.display());
        let base = self.base_environment();
        let output = self.runner.run(&CommandSpec {
            program: path.clone(),
            args: vec![],
            env: base.clone(),
            output: OutputMode::CaptureStdout,
        })?;
        if !output.success() {
            return Err(Error::EnvSetupFailed {
                path,
                code: output.code,
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| Error::EnvSetupOutput(path))?;
        Ok(Some(env::merge_setup_output(&base, &stdout)))
    }

    fn execute_tool(&self, path: &Path, args: &[String], env: Vec<String>) -> Result<()> {
        info!("Executing: {} {args:?}", path.display());
        debug!("{}={}", env::BIN_PATH, self.ctx.bin_path.display());
        debug!("{}={}", env::PROJECT_ROOT, self.ctx.root.display());

        let output = self.runner.run(&CommandSpec {
            program: path.to_path_buf(),
            args: args.to_vec(),
            env,
            output: OutputMode::Inherit,
        })?;
        if output.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed {
                path: path.to_path_buf(),
                code: output.code,
            })
        }
    }

    fn run_reporting(&self) -> Result<()> {
        let Some(cmd) = self.ctx.config.reporting_cmd() else {
            return Ok(());
        };
        let path = self.project_path(cmd);
        if !path.exists() {
            return Err(Error::ReportingMissing(path));
        }
        if !registry::is_executable(&path) {
            return Err(Error::ReportingNotExecutable(path));
        }

        let env = env::reporting_environment(&self.ctx, self.base_environment());
        info!("Executing reporting command: {}", path.display());
        for entry in env.iter().filter(|e| is_reporting_var(e)) {
            debug!("  {entry}");
        }

        let output = self.runner.run(&CommandSpec {
            program: path.clone(),
            args: vec![],
            env,
            output: OutputMode::CaptureAll,
        })?;
        if !output.success() {
            debug!("Reporting command STDOUT: {}", String::from_utf8_lossy(&output.stdout));
            debug!("Reporting command STDERR: {}", String::from_utf8_lossy(&output.stderr));
            return Err(Error::ReportingFailed {
                path,
                code: output.code,
            });
        }
        Ok(())
    }

    /// Resolve a configured script path against the project root.
    fn project_path(&self, configured: &str) -> PathBuf {
        registry::search_dir(&self.ctx.root, configured)
    }
}

fn is_reporting_var(entry: &str) -> bool {
    entry.starts_with("UBER_TIMING")
        || entry.starts_with("UBER_EXECUTED_")
        || entry.starts_with("UBER_ARGS=")
        || entry.starts_with("UBER_TOTAL_TIME_MS=")
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
