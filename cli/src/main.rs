use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use uber_core::{registry, root, split_args, Config, Error, RunContext, ToolExecutor};

/// Project-local tool launcher.
///
/// Global flags go before the command; anything after it is passed to the tool.
#[derive(Debug, Parser)]
#[command(
    name = "uber",
    about = "Run project tools from the paths configured in .uber",
    override_usage = "uber [OPTIONS] [GLOBAL_ARGS]... <COMMAND> [TOOL_ARGS]...",
    after_help = "Unrecognised global flags are passed to tools in UBER_GLOBAL_COMMAND_ARGS.\n\
                  A bare `--flag` takes the next token as its value; write `--flag=value`,\n\
                  or end the global flags with `--`, when the flag stands alone.",
    disable_version_flag = true
)]
struct Cli {
    /// Project root containing the .uber file (default: search upward from the current directory).
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
    /// List available tools in every configured tool path.
    #[arg(long)]
    list_tools: bool,
    /// Print version information.
    #[arg(long)]
    version: bool,
}

/// Version details shown by `--version`.
#[derive(Debug, Clone, Copy)]
struct BuildInfo {
    version: &'static str,
    commit: &'static str,
    date: &'static str,
}

impl BuildInfo {
    fn from_build_env() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("UBER_BUILD_COMMIT").unwrap_or("unknown"),
            date: option_env!("UBER_BUILD_DATE").unwrap_or("unknown"),
        }
    }

    fn print(&self) {
        println!("uber version {}", self.version);
        println!("commit: {}", self.commit);
        println!("date: {}", self.date);
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Error
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let raw: Vec<String> = std::env::args().collect();
    match run(&raw) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("Error: {err}");
            if std::io::stderr().is_terminal() {
                eprintln!("{}", message.red());
            } else {
                eprintln!("{message}");
            }
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

fn run(raw: &[String]) -> Result<(), Error> {
    let (program, args) = raw.split_first().map_or(("uber", &[][..]), |(p, a)| (p.as_str(), a));
    let split = split_args(args);
    let cli = Cli::parse_from(std::iter::once(program.to_string()).chain(split.launcher_flags.iter().cloned()));
    setup_logging(cli.verbose);
    log::debug!(
        "Global args: '{}', command: {:?}",
        split.global_command_args,
        split.command
    );

    if cli.version {
        BuildInfo::from_build_env().print();
        return Ok(());
    }

    if cli.list_tools {
        if let Some(command) = &split.command {
            return Err(Error::UnexpectedCommand(command.clone()));
        }
    } else if split.command.is_none() {
        return Err(Error::MissingCommand);
    }

    let project_root = root::resolve_project_root(cli.root.as_deref())?;
    let config = Config::load(&project_root)?;
    log::debug!("Project root: {}", project_root.display());

    let mut ctx = RunContext::new(project_root, bin_path(program), config)
        .with_verbose(cli.verbose)
        .with_global_command_args(split.global_command_args);
    if let Some(command) = split.command.clone() {
        ctx = ctx.with_command(command, split.remaining.clone());
    }

    let mut executor = ToolExecutor::new(ctx);
    if cli.list_tools {
        return list_tools(&executor);
    }
    executor.find_and_execute(&split.command.unwrap_or_default(), &split.remaining)
}

fn list_tools(executor: &ToolExecutor) -> Result<(), Error> {
    let tools = executor.available_tools()?;

    println!("Available tools:");
    println!();
    for search_path in unique_in_order(&executor.context().config.tool_paths) {
        let mut names: Vec<&str> = tools
            .iter()
            .filter(|tool| tool.search_path == *search_path)
            .map(|tool| tool.name.as_str())
            .collect();
        // a path listed twice in the config was scanned twice
        names.sort_unstable();
        names.dedup();
        let shown = registry::display_names(names);
        if shown.is_empty() {
            continue;
        }
        println!("{}", format!("From {search_path}:").cyan());
        for name in shown {
            println!("  {name}");
        }
        println!();
    }
    Ok(())
}

fn unique_in_order(items: &[String]) -> Vec<&String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// Absolute path of the running launcher.
fn bin_path(program: &str) -> PathBuf {
    let invoked = PathBuf::from(program);
    if invoked.components().count() > 1 {
        if let Ok(path) = std::path::absolute(&invoked) {
            return path;
        }
    }
    std::env::current_exe().unwrap_or(invoked)
}
