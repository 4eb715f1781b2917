//! Pattern extractors over free-form issue text.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Terminator after a bare path within one whitespace-separated token: the
/// original delimiters, or trailing sentence punctuation up to the token end.
const PATH_END: &str = r"(?:[.;!?)]*$|:|,)";

/// Bare paths, matched against each whitespace-separated token.
static TOKEN_PATH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"^(\S+\.[a-zA-Z0-9]{{1,10}}){PATH_END}"),
        format!(r"^((?:\.{{0,2}}/)?(?:\w+/)*\w+\.\w+){PATH_END}"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Quoted or labelled paths, matched against the whole text.
static INLINE_PATH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"in\s+`([^`]+\.[a-zA-Z0-9]{1,10})`",
        r"at\s+`([^`]+\.[a-zA-Z0-9]{1,10})`",
        r#"(?:file|path):\s*['"]?([^'"\s]+\.[a-zA-Z0-9]{1,10})['"]?"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static VERSION_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+(?:\.\d+)+$").unwrap());

static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[A-Za-z_][\w.]*)?(?:Error|Exception):[ \t]*(\S.*?)[ \t]*\r?$")
        .unwrap()
});

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:\w+)?\s*(.*?)```").unwrap());

/// Abbreviations that look like `name.ext` but never name a file.
const NOT_PATHS: &[&str] = &["e.g", "i.e"];

/// Extracts plausible file paths mentioned in `text`.
///
/// URLs, version strings and a few lookalikes are filtered out.
pub fn extract_file_paths(text: &str) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    let mut insert = |candidate: &str| {
        let candidate = candidate.trim();
        if is_plausible_path(candidate) {
            paths.insert(candidate.to_string());
        }
    };

    for token in text.split_whitespace() {
        for pattern in TOKEN_PATH_PATTERNS.iter() {
            if let Some(candidate) = pattern.captures(token).and_then(|caps| caps.get(1)) {
                insert(candidate.as_str());
            }
        }
    }
    for pattern in INLINE_PATH_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(candidate) = caps.get(1) {
                insert(candidate.as_str());
            }
        }
    }
    paths
}

fn is_plausible_path(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.starts_with("http")
        && !candidate.contains("://")
        && !candidate.ends_with(".0")
        && !candidate.ends_with(".com")
        && !VERSION_LIKE.is_match(candidate)
        && !NOT_PATHS.contains(&candidate)
}

/// Extracts error lines and error-bearing fenced blocks, in order.
///
/// An error line starts with `Error:`/`Exception:` or an identifier ending in
/// one of them (`KeyError:`); the captured message follows the colon. A fenced
/// block contributes its whole trimmed content when it mentions `Error:`,
/// `Exception:` or `Traceback`.
pub fn extract_error_messages(text: &str) -> Vec<String> {
    let mut messages: Vec<(usize, String)> = ERROR_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let message = caps.get(1)?;
            Some((message.start(), message.as_str().trim().to_string()))
        })
        .collect();

    for caps in CODE_BLOCK.captures_iter(text) {
        let Some(block) = caps.get(1) else {
            continue;
        };
        let content = block.as_str().trim();
        if content.contains("Error:") || content.contains("Exception:") || content.contains("Traceback")
        {
            messages.push((block.start(), content.to_string()));
        }
    }

    messages.sort_by_key(|(offset, _)| *offset);
    messages.into_iter().map(|(_, message)| message).collect()
}

/// Extracts the trimmed, non-empty contents of fenced code blocks.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    CODE_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|block| !block.is_empty())
        .collect()
}
