//! Unified-diff hunk application.
//!
//! Only the subset of unified diff the fix tool emits is supported: a
//! sequence of `@@ -a,b +c,d @@` hunks for a single file. File headers,
//! `\ No newline at end of file` markers and text outside hunks are ignored.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static HUNK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

/// Errors that can occur while applying a patch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The diff body contains no hunk headers.
    #[error("Diff contains no hunks")]
    NoHunks,

    /// A hunk ended before its declared line counts were reached.
    #[error("Hunk starting at line {old_start} is truncated")]
    Truncated { old_start: usize },

    /// A hunk line does not start with ' ', '+' or '-'.
    #[error("Malformed hunk line: {line}")]
    Malformed { line: String },

    /// The hunk's context and removed lines were not found in the file.
    #[error("Hunk starting at line {old_start} does not match the file content")]
    HunkMismatch { old_start: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HunkLine {
    Context(String),
    Remove(String),
    Add(String),
}

#[derive(Debug, Clone)]
struct Hunk {
    old_start: usize,
    old_len: usize,
    lines: Vec<HunkLine>,
}

impl Hunk {
    /// Lines expected in the original file.
    fn old_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(text) | HunkLine::Remove(text) => Some(text.as_str()),
                HunkLine::Add(_) => None,
            })
            .collect()
    }

    /// Lines present after applying the hunk at `position`.
    ///
    /// Context lines are taken from the file so whitespace the comparison
    /// tolerated is preserved.
    fn replacement(&self, lines: &[String], position: usize) -> Vec<String> {
        let mut cursor = position;
        let mut out = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match line {
                HunkLine::Context(_) => {
                    out.push(lines[cursor].clone());
                    cursor += 1;
                }
                HunkLine::Remove(_) => cursor += 1,
                HunkLine::Add(text) => out.push(text.clone()),
            }
        }
        out
    }

    /// Zero-based index where the old lines begin.
    ///
    /// For pure insertions (`-k,0`) the header names the line after which
    /// content is inserted.
    fn anchor(&self) -> usize {
        if self.old_len == 0 {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }
}

fn parse_count(caps: &regex::Captures<'_>, index: usize) -> usize {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

fn parse_hunks(diff: &str) -> Result<Vec<Hunk>, PatchError> {
    let mut hunks = Vec::new();
    let mut lines = diff.lines();

    while let Some(line) = lines.next() {
        let Some(caps) = HUNK_HEADER.captures(line) else {
            continue;
        };
        let old_start = parse_count(&caps, 1);
        let old_len = parse_count(&caps, 2);
        let new_len = parse_count(&caps, 4);

        let (mut old_left, mut new_left) = (old_len, new_len);
        let mut body = Vec::new();

        while old_left > 0 || new_left > 0 {
            let Some(next) = lines.next() else {
                return Err(PatchError::Truncated { old_start });
            };
            if next.starts_with('\\') {
                continue;
            }

            let malformed = || PatchError::Malformed {
                line: next.to_string(),
            };
            match next.chars().next() {
                Some('+') => {
                    new_left = new_left.checked_sub(1).ok_or_else(malformed)?;
                    body.push(HunkLine::Add(next[1..].to_string()));
                }
                Some('-') => {
                    old_left = old_left.checked_sub(1).ok_or_else(malformed)?;
                    body.push(HunkLine::Remove(next[1..].to_string()));
                }
                Some(' ') | None => {
                    old_left = old_left.checked_sub(1).ok_or_else(malformed)?;
                    new_left = new_left.checked_sub(1).ok_or_else(malformed)?;
                    body.push(HunkLine::Context(next.get(1..).unwrap_or("").to_string()));
                }
                Some(_) => return Err(malformed()),
            }
        }

        hunks.push(Hunk {
            old_start,
            old_len,
            lines: body,
        });
    }

    if hunks.is_empty() {
        return Err(PatchError::NoHunks);
    }
    Ok(hunks)
}

fn block_matches(lines: &[String], at: usize, block: &[&str]) -> bool {
    at + block.len() <= lines.len()
        && block
            .iter()
            .zip(&lines[at..])
            .all(|(expected, actual)| expected.trim_end() == actual.trim_end())
}

/// Applies the hunks of a unified diff to `original`.
///
/// Each hunk is tried at its declared position, shifted by the net line
/// change of earlier hunks. If the context does not match there, the first
/// matching location after the previous hunk is used instead.
///
/// # Errors
///
/// Returns [`PatchError`] if the diff has no hunks, is malformed, or a hunk
/// cannot be located.
pub fn apply_patch(original: &str, diff: &str) -> Result<String, PatchError> {
    let hunks = parse_hunks(diff)?;
    let keep_trailing_newline = original.is_empty() || original.ends_with('\n');
    let mut lines: Vec<String> = original.lines().map(str::to_string).collect();

    let mut offset: isize = 0;
    let mut floor = 0usize;

    for hunk in &hunks {
        let old_block = hunk.old_lines();
        let anchor = hunk.anchor();

        let expected = usize::try_from(anchor as isize + offset)
            .unwrap_or(0)
            .max(floor);
        let position = if block_matches(&lines, expected, &old_block) {
            expected
        } else {
            (floor..=lines.len().saturating_sub(old_block.len()))
                .find(|&at| block_matches(&lines, at, &old_block))
                .ok_or(PatchError::HunkMismatch {
                    old_start: hunk.old_start,
                })?
        };

        let new_block = hunk.replacement(&lines, position);
        let added = new_block.len();
        lines.splice(position..position + old_block.len(), new_block);
        offset = position as isize - anchor as isize + added as isize - old_block.len() as isize;
        floor = position + added;
    }

    let mut patched = lines.join("\n");
    if keep_trailing_newline && !patched.is_empty() {
        patched.push('\n');
    }
    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANDLER: &str = "def handler(payload):\n    return payload[\"action\"]\n";

    #[test]
    fn applies_single_hunk() {
        let diff = "--- a/src/app.py\n+++ b/src/app.py\n@@ -1,2 +1,2 @@\n def handler(payload):\n-    return payload[\"action\"]\n+    return payload.get(\"action\")\n";
        let patched = apply_patch(HANDLER, diff).unwrap();
        assert_eq!(
            patched,
            "def handler(payload):\n    return payload.get(\"action\")\n"
        );
    }

    #[test]
    fn applies_multiple_hunks_with_offset() {
        let original = "a\nb\nc\nd\ne\nf\ng\n";
        let diff = "@@ -1,2 +1,3 @@\n a\n+a2\n b\n@@ -6,2 +7,1 @@\n f\n-g\n";
        let patched = apply_patch(original, diff).unwrap();
        assert_eq!(patched, "a\na2\nb\nc\nd\ne\nf\n");
    }

    #[test]
    fn relocates_hunk_with_stale_line_numbers() {
        let original = "header\nextra\nfn main() {\n    old();\n}\n";
        let diff = "@@ -1,3 +1,3 @@\n fn main() {\n-    old();\n+    new();\n }\n";
        let patched = apply_patch(original, diff).unwrap();
        assert_eq!(patched, "header\nextra\nfn main() {\n    new();\n}\n");
    }

    #[test]
    fn mismatched_hunk_is_an_error() {
        let diff = "@@ -1,1 +1,1 @@\n-missing\n+present\n";
        assert_eq!(
            apply_patch("something else\n", diff),
            Err(PatchError::HunkMismatch { old_start: 1 })
        );
    }

    #[test]
    fn diff_without_hunks_is_an_error() {
        assert_eq!(
            apply_patch("x\n", "--- a/x\n+++ b/x\n"),
            Err(PatchError::NoHunks)
        );
    }

    #[test]
    fn truncated_hunk_is_an_error() {
        let diff = "@@ -1,3 +1,3 @@\n a\n";
        assert_eq!(
            apply_patch("a\nb\nc\n", diff),
            Err(PatchError::Truncated { old_start: 1 })
        );
    }

    #[test]
    fn creates_new_file_from_empty_content() {
        let diff = "--- /dev/null\n+++ b/notes.txt\n@@ -0,0 +1,2 @@\n+first\n+second\n";
        assert_eq!(apply_patch("", diff).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn preserves_missing_trailing_newline() {
        let diff = "@@ -1 +1 @@\n-one\n+uno\n\\ No newline at end of file\n";
        assert_eq!(apply_patch("one", diff).unwrap(), "uno");
    }

    #[test]
    fn tolerates_trailing_whitespace_differences() {
        let diff = "@@ -1,2 +1,2 @@\n keep\n-drop\n+add\n";
        assert_eq!(apply_patch("keep   \ndrop\n", diff).unwrap(), "keep   \nadd\n");
    }

    #[test]
    fn ignores_text_after_last_hunk() {
        let diff = "@@ -1 +1 @@\n-one\n+two\nSolution: renamed the value.\n";
        assert_eq!(apply_patch("one\n", diff).unwrap(), "two\n");
    }
}
