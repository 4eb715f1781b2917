//! Selection of the files handed to the fix tool.

use super::output::normalize_path;
use super::InvocationError;
use crate::config::FilePolicy;
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Upper bound on files selected through include globs.
pub const MAX_GLOB_TARGETS: usize = 25;

/// Conventional entry points tried when nothing else resolves.
pub const FALLBACK_TARGETS: &[&str] = &[
    "README.md",
    "src/main.py",
    "main.py",
    "app.py",
    "src/app.py",
    "src/main.rs",
    "src/lib.rs",
    "index.js",
    "src/index.js",
    "src/index.ts",
    "main.go",
];

/// Chooses the files the tool should edit.
///
/// In priority order:
/// 1. paths named in the issue that exist in `work_dir` and are not excluded
/// 2. files matching the include globs (sorted, at most [`MAX_GLOB_TARGETS`])
/// 3. existing entries of [`FALLBACK_TARGETS`]
///
/// # Errors
///
/// Returns [`InvocationError::NoTargetFiles`] when every tier is empty.
pub fn select_target_files(
    work_dir: &Path,
    mentioned: &BTreeSet<String>,
    files: &FilePolicy,
) -> Result<Vec<String>, InvocationError> {
    let excludes = compile_patterns(&files.exclude);

    let from_issue: Vec<String> = mentioned
        .iter()
        .filter_map(|path| normalize_path(path))
        .filter(|path| work_dir.join(path).is_file())
        .filter(|path| !is_excluded(path, &excludes))
        .collect();
    if !from_issue.is_empty() {
        debug!(count = from_issue.len(), "Using files named in the issue");
        return Ok(from_issue);
    }

    let from_includes = expand_includes(work_dir, &files.include, &excludes);
    if !from_includes.is_empty() {
        debug!(count = from_includes.len(), "Using files matching include patterns");
        return Ok(from_includes);
    }

    let fallback: Vec<String> = FALLBACK_TARGETS
        .iter()
        .filter(|path| work_dir.join(path).is_file())
        .filter(|path| !is_excluded(path, &excludes))
        .map(ToString::to_string)
        .collect();
    if fallback.is_empty() {
        return Err(InvocationError::NoTargetFiles);
    }
    debug!(count = fallback.len(), "Using fallback files");
    Ok(fallback)
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|pattern| match Pattern::new(pattern) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Ignoring invalid glob pattern");
                None
            }
        })
        .collect()
}

fn is_excluded(path: &str, excludes: &[Pattern]) -> bool {
    excludes.iter().any(|pattern| pattern.matches(path))
}

fn expand_includes(work_dir: &Path, include: &[String], excludes: &[Pattern]) -> Vec<String> {
    let includes = compile_patterns(include);
    if includes.is_empty() {
        return Vec::new();
    }

    let mut matched: Vec<String> = collect_files(work_dir)
        .into_iter()
        .filter(|path| includes.iter().any(|pattern| pattern.matches(path)))
        .filter(|path| !is_excluded(path, excludes))
        .collect();
    matched.sort();
    matched.truncate(MAX_GLOB_TARGETS);
    matched
}

/// Lists files under `work_dir` as `/`-separated relative paths, skipping
/// `.git`.
fn collect_files(work_dir: &Path) -> Vec<String> {
    WalkDir::new(work_dir)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(work_dir).ok()?;
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            Some(parts.join("/"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo_with(files: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for file in files {
            let path = temp_dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "content\n").unwrap();
        }
        temp_dir
    }

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(ToString::to_string).collect()
    }

    fn policy(include: &[&str], exclude: &[&str]) -> FilePolicy {
        FilePolicy {
            include: include.iter().map(ToString::to_string).collect(),
            exclude: exclude.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn prefers_existing_issue_paths() {
        let repo = repo_with(&["src/app.py", "src/other.py"]);
        let targets = select_target_files(
            repo.path(),
            &set(&["src/app.py", "missing.py"]),
            &FilePolicy::default(),
        )
        .unwrap();
        assert_eq!(targets, vec!["src/app.py"]);
    }

    #[test]
    fn rejects_paths_escaping_the_repository() {
        let repo = repo_with(&["src/app.py"]);
        let targets = select_target_files(
            repo.path(),
            &set(&["../src/app.py"]),
            &policy(&["src/**"], &[]),
        )
        .unwrap();
        assert_eq!(targets, vec!["src/app.py"]);
    }

    #[test]
    fn excluded_issue_paths_fall_through_to_includes() {
        let repo = repo_with(&["gen/out.rs", "src/lib.rs"]);
        let targets = select_target_files(
            repo.path(),
            &set(&["gen/out.rs"]),
            &policy(&["**/*.rs"], &["gen/**"]),
        )
        .unwrap();
        assert_eq!(targets, vec!["src/lib.rs"]);
    }

    #[test]
    fn include_globs_are_sorted_and_skip_git() {
        let repo = repo_with(&["b.py", "a.py", ".git/config", "docs/readme.txt"]);
        let targets =
            select_target_files(repo.path(), &BTreeSet::new(), &FilePolicy::default()).unwrap();
        assert_eq!(targets, vec!["a.py", "b.py", "docs/readme.txt"]);
    }

    #[test]
    fn nested_directories_are_walked() {
        let repo = repo_with(&["src/api/handlers/webhook.py", ".git/objects/ab/cd", "setup.cfg"]);
        let targets =
            select_target_files(repo.path(), &BTreeSet::new(), &policy(&["**/*.py"], &[]))
                .unwrap();
        assert_eq!(targets, vec!["src/api/handlers/webhook.py"]);
    }

    #[test]
    fn include_globs_are_capped() {
        let names: Vec<String> = (0..40).map(|i| format!("f{i:02}.txt")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let repo = repo_with(&refs);
        let targets =
            select_target_files(repo.path(), &BTreeSet::new(), &FilePolicy::default()).unwrap();
        assert_eq!(targets.len(), MAX_GLOB_TARGETS);
        assert_eq!(targets[0], "f00.txt");
    }

    #[test]
    fn falls_back_to_conventional_entry_points() {
        let repo = repo_with(&["main.go", "vendor/x.go"]);
        let targets =
            select_target_files(repo.path(), &BTreeSet::new(), &policy(&["nothing/**"], &[]))
                .unwrap();
        assert_eq!(targets, vec!["main.go"]);
    }

    #[test]
    fn no_targets_is_an_error() {
        let repo = repo_with(&["vendor/x.go"]);
        let result = select_target_files(repo.path(), &BTreeSet::new(), &policy(&[], &[]));
        assert!(matches!(result, Err(InvocationError::NoTargetFiles)));
    }
}
