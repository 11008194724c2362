//! Splitting the raw argument list into launcher flags, command, and tool arguments.
//!
//! Anything before the command token is a global flag. Flags the launcher does
//! not know are passed through to tools verbatim via `UBER_GLOBAL_COMMAND_ARGS`.

/// Launcher flags that never take a value.
const SWITCHES: &[&str] = &["-v", "--verbose", "--list-tools", "--version", "-h", "--help"];

/// Launcher flags that take a value as the following token or after `=`.
const VALUED: &[&str] = &["--root"];

/// Result of [`split_args`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitArgs {
    /// Tokens belonging to launcher flags, in order, ready for the flag parser.
    pub launcher_flags: Vec<String>,
    /// The command token, if one was present.
    pub command: Option<String>,
    /// Everything after the command, untouched.
    pub remaining: Vec<String>,
    /// Space-joined tokens that preceded the command.
    pub global_command_args: String,
}

/// Split `args` (program name excluded) at the first command token.
pub fn split_args<S: AsRef<str>>(args: &[S]) -> SplitArgs {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    let mut launcher_flags = Vec::new();
    let mut i = 0;
    let mut prefix_end = None;

    while i < args.len() {
        let token = args[i];
        if token == "--" {
            prefix_end = Some(i + 1);
            break;
        }
        if !is_flag(token) {
            break;
        }

        let name = token.split_once('=').map_or(token, |(name, _)| name);
        if SWITCHES.contains(&token) {
            launcher_flags.push(token.to_string());
        } else if VALUED.contains(&name) {
            launcher_flags.push(token.to_string());
            if name == token {
                if let Some(value) = args.get(i + 1) {
                    launcher_flags.push(value.to_string());
                    i += 1;
                }
            }
        } else if name == token && args.get(i + 1).is_some_and(|next| !is_flag(next)) {
            // pass-through flag with its value in the next token
            i += 1;
        }
        i += 1;
    }

    // `--` stays in the global section; the command is the token after it.
    let command_index = prefix_end.unwrap_or(i);
    let global_command_args = args[..command_index].join(" ");
    let command = args.get(command_index).map(|s| s.to_string());
    let remaining = args
        .get(command_index + 1..)
        .unwrap_or_default()
        .iter()
        .map(|s| s.to_string())
        .collect();

    SplitArgs {
        launcher_flags,
        command,
        remaining,
        global_command_args,
    }
}

fn is_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}
