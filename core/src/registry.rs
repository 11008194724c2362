//! Tool discovery and name resolution across the configured search paths.

use crate::{Error, Result};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An executable found while scanning a search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableTool {
    /// Bare filename of the executable.
    pub name: String,
    /// Search path entry it was found under, as written in the configuration.
    pub search_path: String,
}

/// A candidate considered while resolving one requested name in one search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMatch {
    pub name: String,
    pub search_path: String,
    pub full_path: PathBuf,
    /// 0 for the exact bare name, 1 for the name plus an extension.
    pub priority: u8,
}

/// The single executable selected for a requested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    /// Filename that matched, including any extension.
    pub name: String,
    /// Search path entry that produced the match.
    pub search_path: String,
    /// Absolute path to the executable.
    pub full_path: PathBuf,
}

/// Outcome of searching a single search path.
enum PathLookup {
    Found(ResolvedTool),
    NoMatch,
    DirMissing,
}

/// Directory a search path entry refers to, relative entries anchored at `root`.
pub fn search_dir(root: &Path, search_path: &str) -> PathBuf {
    let path = Path::new(search_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Whether `path` is a regular file with at least one execute bit set.
pub fn is_executable(path: impl AsRef<Path>) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Whether a requested name already carries an extension.
pub fn has_extension(name: &str) -> bool {
    name.contains('.')
}

/// Extension of `name` including the leading dot, taken from the last dot.
pub fn extension_of(name: &str) -> Option<&str> {
    name.rfind('.').map(|idx| &name[idx..])
}

/// Executable filenames in `dir`, sorted by name.
///
/// A missing directory yields an empty list; other read failures are errors.
pub fn list_executables(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(source) => {
            return Err(Error::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| is_executable(entry.path()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

/// Every executable under every search path, in configuration order then name order.
///
/// Paths that cannot be read are skipped.
pub fn all_available_tools(root: &Path, search_paths: &[String]) -> Result<Vec<AvailableTool>> {
    if search_paths.is_empty() {
        return Err(Error::NoToolPaths);
    }

    let mut tools = Vec::new();
    for search_path in search_paths {
        match list_executables(&search_dir(root, search_path)) {
            Ok(names) => tools.extend(names.into_iter().map(|name| AvailableTool {
                name,
                search_path: search_path.clone(),
            })),
            Err(err) => debug!("Error scanning path '{search_path}': {err}"),
        }
    }
    Ok(tools)
}

/// Names to show for the tools of one search path.
///
/// A tool is shown by its base name when that base resolves back to it, i.e.
/// it is the only listed name equal to the base or starting with `base.`;
/// otherwise its full filename is shown.
pub fn display_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<&str> = names.into_iter().collect();

    let mut shown: Vec<String> = names
        .iter()
        .map(|&name| {
            let stem = name.rfind('.').map_or(name, |idx| &name[..idx]);
            if stem.is_empty() || has_extension(stem) {
                return name.to_string();
            }
            let prefix = format!("{stem}.");
            let candidates = names
                .iter()
                .filter(|&&other| other == stem || other.starts_with(&prefix))
                .count();
            if candidates == 1 {
                stem.to_string()
            } else {
                name.to_string()
            }
        })
        .collect();
    shown.sort();
    shown.dedup();
    shown
}

/// Resolve `requested` against `search_paths`, first matching path wins.
pub fn resolve(root: &Path, search_paths: &[String], requested: &str) -> Result<ResolvedTool> {
    if search_paths.is_empty() {
        return Err(Error::NoToolPaths);
    }

    let mut missing_dirs = 0;
    for search_path in search_paths {
        match resolve_in_path(root, search_path, requested)? {
            PathLookup::Found(tool) => return Ok(tool),
            PathLookup::NoMatch => {}
            PathLookup::DirMissing => missing_dirs += 1,
        }
    }

    if search_paths.len() == 1 && missing_dirs == 1 {
        return Err(Error::ToolPathMissing(search_paths[0].clone()));
    }

    Err(Error::ToolNotFound {
        name: requested.to_string(),
        suggestions: suggestions(root, search_paths, requested),
    })
}

fn resolve_in_path(root: &Path, search_path: &str, requested: &str) -> Result<PathLookup> {
    let dir = search_dir(root, search_path);
    if !dir.exists() {
        return Ok(PathLookup::DirMissing);
    }

    if has_extension(requested) {
        let full_path = dir.join(requested);
        if is_executable(&full_path) {
            return Ok(PathLookup::Found(ResolvedTool {
                name: requested.to_string(),
                search_path: search_path.to_string(),
                full_path,
            }));
        }
        return Ok(PathLookup::NoMatch);
    }

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PathLookup::DirMissing),
        Err(err) => {
            debug!("Skipping tool path '{search_path}': {err}");
            return Ok(PathLookup::NoMatch);
        }
    };

    let prefix = format!("{requested}.");
    let mut matches: Vec<ToolMatch> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name == requested || name.starts_with(&prefix))
        .map(|name| {
            let full_path = dir.join(&name);
            let priority = if name == requested { 0 } else { 1 };
            ToolMatch {
                name,
                search_path: search_path.to_string(),
                full_path,
                priority,
            }
        })
        .filter(|candidate| is_executable(&candidate.full_path))
        .collect();

    matches.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

    match matches.as_slice() {
        [] => Ok(PathLookup::NoMatch),
        [only] => Ok(PathLookup::Found(only.clone().into())),
        [first, ..] if first.priority == 0 => Ok(PathLookup::Found(first.clone().into())),
        _ => Err(Error::AmbiguousTool {
            name: requested.to_string(),
            search_path: search_path.to_string(),
            candidates: matches.into_iter().map(|m| m.name).collect(),
        }),
    }
}

/// Executables in any search path named `requested` plus an extension.
fn suggestions(root: &Path, search_paths: &[String], requested: &str) -> Vec<String> {
    let prefix = format!("{requested}.");
    search_paths
        .iter()
        .filter_map(|search_path| list_executables(&search_dir(root, search_path)).ok())
        .flatten()
        .filter(|name| name.starts_with(&prefix))
        .collect()
}

impl From<ToolMatch> for ResolvedTool {
    fn from(m: ToolMatch) -> Self {
        Self {
            name: m.name,
            search_path: m.search_path,
            full_path: m.full_path,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    pub(crate) fn write_executable(dir: &Path, name: &str, body: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            write_executable(dir, name, "#!/bin/sh\necho test\n");
        }
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn executable_requires_regular_file_and_mode_bit() {
        let dir = tempfile::tempdir().unwrap();
        let tool = write_executable(dir.path(), "tool", "#!/bin/sh\n");
        assert!(is_executable(&tool));

        let plain = dir.path().join("plain");
        fs::write(&plain, "data").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!is_executable(&plain));

        let group_only = dir.path().join("group-only");
        fs::write(&group_only, "data").unwrap();
        fs::set_permissions(&group_only, fs::Permissions::from_mode(0o610)).unwrap();
        assert!(is_executable(&group_only));

        let sub = dir.path().join("subdir");
        fs::create_dir(&sub).unwrap();
        assert!(!is_executable(&sub));
        assert!(!is_executable(dir.path().join("missing")));
    }

    #[test]
    fn resolves_names_with_and_without_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["foo.sh", "foo.py", "bar.sh", "baz"]);
        let search = paths(&["."]);

        let tool = resolve(dir.path(), &search, "foo.sh").unwrap();
        assert_eq!(tool.name, "foo.sh");
        assert_eq!(tool.full_path, dir.path().join(".").join("foo.sh"));

        assert_eq!(resolve(dir.path(), &search, "baz").unwrap().name, "baz");
        assert_eq!(resolve(dir.path(), &search, "bar").unwrap().name, "bar.sh");

        let err = resolve(dir.path(), &search, "foo").unwrap_err();
        assert!(err.to_string().contains("ambiguous tool name"));
        assert!(err.to_string().contains(".sh"));
        assert!(err.to_string().contains(".py"));

        let err = resolve(dir.path(), &search, "nonexistent").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn bare_name_beats_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["foo", "foo.sh", "foo.py"]);
        let tool = resolve(dir.path(), &paths(&["."]), "foo").unwrap();
        assert_eq!(tool.name, "foo");
    }

    #[test]
    fn explicit_extension_only_checks_that_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["foo.py"]);
        let search = paths(&["."]);
        assert_eq!(resolve(dir.path(), &search, "foo.py").unwrap().name, "foo.py");
        assert_eq!(resolve(dir.path(), &search, "foo").unwrap().name, "foo.py");
        assert!(matches!(
            resolve(dir.path(), &search, "foo.sh"),
            Err(Error::ToolNotFound { .. })
        ));
    }

    #[test]
    fn first_matching_path_wins() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("first"), &["deploy.sh"]);
        touch(&root.path().join("second"), &["deploy", "deploy.py"]);

        let tool = resolve(root.path(), &paths(&["first", "second"]), "deploy").unwrap();
        assert_eq!(tool.search_path, "first");
        assert_eq!(tool.name, "deploy.sh");
    }

    #[test]
    fn later_paths_are_not_consulted_after_ambiguity() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("first"), &["deploy.sh", "deploy.py"]);
        touch(&root.path().join("second"), &["deploy"]);

        let err = resolve(root.path(), &paths(&["first", "second"]), "deploy").unwrap_err();
        assert!(matches!(err, Error::AmbiguousTool { .. }));
    }

    #[test]
    fn explicit_extension_falls_through_to_later_paths() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("first"), &["other"]);
        touch(&root.path().join("second"), &["lint.sh"]);

        let tool = resolve(root.path(), &paths(&["first", "missing", "second"]), "lint.sh").unwrap();
        assert_eq!(tool.search_path, "second");
    }

    #[test]
    fn non_executable_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["fmt.sh"]);
        let plain = dir.path().join("fmt.py");
        fs::write(&plain, "print()").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(resolve(dir.path(), &paths(&["."]), "fmt").unwrap().name, "fmt.sh");
    }

    #[test]
    fn absolute_search_paths_ignore_root() {
        let tools = tempfile::tempdir().unwrap();
        touch(tools.path(), &["abs-tool"]);
        let absolute = tools.path().to_string_lossy().into_owned();

        let tool = resolve(Path::new("/nonexistent/root"), &[absolute.clone()], "abs-tool").unwrap();
        assert_eq!(tool.search_path, absolute);
        assert_eq!(tool.full_path, tools.path().join("abs-tool"));
    }

    #[test]
    fn unreadable_search_path_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("afile"), "not a directory").unwrap();
        touch(&root.path().join("bin"), &["deploy", "check.sh"]);
        let search = paths(&["afile", "bin"]);

        assert_eq!(resolve(root.path(), &search, "deploy").unwrap().search_path, "bin");
        assert_eq!(resolve(root.path(), &search, "check.sh").unwrap().search_path, "bin");

        let err = resolve(root.path(), &paths(&["afile"]), "deploy").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));

        let tools = all_available_tools(root.path(), &search).unwrap();
        let listed: Vec<(&str, &str)> = tools
            .iter()
            .map(|t| (t.search_path.as_str(), t.name.as_str()))
            .collect();
        assert_eq!(listed, vec![("bin", "check.sh"), ("bin", "deploy")]);
    }

    #[test]
    fn no_tool_paths_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(resolve(dir.path(), &[], "x"), Err(Error::NoToolPaths)));
        assert!(matches!(all_available_tools(dir.path(), &[]), Err(Error::NoToolPaths)));
    }

    #[test]
    fn single_missing_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path(), &paths(&["bin"]), "x").unwrap_err();
        assert_eq!(err.to_string(), "tool path 'bin' does not exist");

        let err = resolve(dir.path(), &paths(&["bin", "tools"]), "x").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[test]
    fn not_found_suggests_dotted_siblings() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("bin"), &["v1.2.sh", "v1.2.py", "other"]);

        // `v1.2` reads as an explicit extension, so only the exact file is checked
        let err = resolve(root.path(), &paths(&["gone", "bin"]), "v1.2").unwrap_err();
        match &err {
            Error::ToolNotFound { name, suggestions } => {
                assert_eq!(name, "v1.2");
                assert_eq!(suggestions, &vec!["v1.2.py".to_string(), "v1.2.sh".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().ends_with("Did you mean: v1.2.py, v1.2.sh?"));

        let err = resolve(root.path(), &paths(&["bin"]), "release").unwrap_err();
        assert!(matches!(&err, Error::ToolNotFound { suggestions, .. } if suggestions.is_empty()));
    }

    #[test]
    fn suggestions_collect_across_paths() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("a"), &["ship.sh"]);
        touch(&root.path().join("b"), &["ship.py"]);

        let found = suggestions(root.path(), &paths(&["a", "missing", "b"]), "ship");
        assert_eq!(found, vec!["ship.sh", "ship.py"]);
    }

    #[test]
    fn lists_tools_in_path_then_name_order() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("b"), &["zeta", "alpha.sh"]);
        touch(&root.path().join("a"), &["tool1.sh", "tool1.py", "tool3"]);
        fs::create_dir_all(root.path().join("a").join("nested")).unwrap();

        let tools = all_available_tools(root.path(), &paths(&["b", "missing", "a"])).unwrap();
        let listed: Vec<(&str, &str)> = tools
            .iter()
            .map(|t| (t.search_path.as_str(), t.name.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("b", "alpha.sh"),
                ("b", "zeta"),
                ("a", "tool1.py"),
                ("a", "tool1.sh"),
                ("a", "tool3"),
            ]
        );
    }

    #[test]
    fn display_names_collapse_unique_bases() {
        let shown = display_names(["tool1.sh", "tool1.py", "tool2.sh", "tool3", "a.b.sh"]);
        assert_eq!(shown, vec!["a.b.sh", "tool1.py", "tool1.sh", "tool2", "tool3"]);

        let shown = display_names(["foo", "foo.sh"]);
        assert_eq!(shown, vec!["foo", "foo.sh"]);

        let shown = display_names(["foo.sh", "foo.bar.sh"]);
        assert_eq!(shown, vec!["foo.bar.sh", "foo.sh"]);
    }

    #[test]
    fn listed_names_resolve_back_to_the_same_tool() {
        let root = tempfile::tempdir().unwrap();
        touch(
            &root.path().join("bin"),
            &["build.sh", "test", "lint.py", "lint.sh", "x.y.sh", "foo.sh", "foo.bar.sh"],
        );
        let search = paths(&["bin"]);

        let tools = all_available_tools(root.path(), &search).unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        for shown in display_names(names.iter().copied()) {
            let tool = resolve(root.path(), &search, &shown).unwrap();
            assert!(names.contains(&tool.name.as_str()));
            assert!(tool.name == shown || tool.name.starts_with(&format!("{shown}.")));
        }
    }
}
