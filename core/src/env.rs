//! Environment composition for tools, the env setup script, and the reporting command.
//!
//! Environments are flat `KEY=VALUE` lists. When a key repeats, the last entry wins.

use crate::RunContext;
use std::collections::HashMap;

pub const BIN_PATH: &str = "UBER_BIN_PATH";
pub const PROJECT_ROOT: &str = "UBER_PROJECT_ROOT";
pub const VERBOSE: &str = "UBER_VERBOSE";
pub const GLOBAL_COMMAND_ARGS: &str = "UBER_GLOBAL_COMMAND_ARGS";
pub const EXECUTED_COMMAND: &str = "UBER_EXECUTED_COMMAND";
pub const EXECUTED_TOOL_PATH: &str = "UBER_EXECUTED_TOOL_PATH";
pub const ARGS: &str = "UBER_ARGS";
pub const TIMING_FIND_TOOL_MS: &str = "UBER_TIMING_FIND_TOOL_MS";
pub const TIMING_ENV_SETUP_MS: &str = "UBER_TIMING_ENV_SETUP_MS";
pub const TIMING_EXECUTION_MS: &str = "UBER_TIMING_EXECUTION_MS";
pub const TOTAL_TIME_MS: &str = "UBER_TOTAL_TIME_MS";

/// Variables owned by the launcher. Inherited values are dropped so a nested
/// invocation never leaks its parent's context.
const CONTROLLED: &[&str] = &[
    BIN_PATH,
    PROJECT_ROOT,
    VERBOSE,
    GLOBAL_COMMAND_ARGS,
    EXECUTED_COMMAND,
    EXECUTED_TOOL_PATH,
    ARGS,
    TIMING_FIND_TOOL_MS,
    TIMING_ENV_SETUP_MS,
    TIMING_EXECUTION_MS,
    TOTAL_TIME_MS,
];

/// The launcher's own environment. Variables that are not valid UTF-8 are skipped.
pub fn inherited() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Inherited variables plus the context variables every subprocess receives.
pub fn base_environment<I>(ctx: &RunContext, inherited: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: Vec<String> = inherited
        .into_iter()
        .filter(|(key, _)| !CONTROLLED.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    env.push(format!("{BIN_PATH}={}", ctx.bin_path.display()));
    env.push(format!("{PROJECT_ROOT}={}", ctx.root.display()));
    if ctx.verbose {
        env.push(format!("{VERBOSE}=1"));
    }
    if !ctx.global_command_args.is_empty() {
        env.push(format!("{GLOBAL_COMMAND_ARGS}={}", ctx.global_command_args));
    }
    env
}

/// Overlay `KEY=VALUE` lines printed by the env setup script onto `base`.
///
/// Lines without `=` are ignored. The result is in no particular order.
pub fn merge_setup_output(base: &[String], output: &str) -> Vec<String> {
    let mut merged: HashMap<&str, &str> = base.iter().filter_map(|entry| entry.split_once('=')).collect();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once('=') {
            merged.insert(key, value);
        }
    }
    merged
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
}

/// `base` plus the execution and timing variables handed to the reporting command.
pub fn reporting_environment(ctx: &RunContext, mut base: Vec<String>) -> Vec<String> {
    let timings = ctx.timings;
    base.extend([
        format!("{EXECUTED_COMMAND}={}", ctx.command),
        format!("{EXECUTED_TOOL_PATH}={}", ctx.found_tool_path.as_deref().unwrap_or_default()),
        format!("{ARGS}={}", ctx.remaining_args.join(" ")),
        format!("{TIMING_FIND_TOOL_MS}={}", timings.find_tool_ms),
        format!("{TIMING_ENV_SETUP_MS}={}", timings.env_setup_ms),
        format!("{TIMING_EXECUTION_MS}={}", timings.execution_ms),
        format!("{TOTAL_TIME_MS}={}", timings.total_ms()),
    ]);
    base
}

/// Effective value of `key` in `env`.
pub fn lookup<'a>(env: &'a [String], key: &str) -> Option<&'a str> {
    env.iter()
        .rev()
        .filter_map(|entry| entry.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, value)| value)
}
