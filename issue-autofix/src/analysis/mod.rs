//! Heuristic issue analysis.
//!
//! [`analyze`] is a pure function of the issue body: it extracts file paths,
//! error messages and code blocks, classifies the issue by keyword voting and
//! scores how likely an automated fix is to succeed.

mod extract;
mod result;

pub use extract::{extract_code_blocks, extract_error_messages, extract_file_paths};
pub use result::{AnalysisResult, IssueType};

use regex::Regex;
use std::sync::LazyLock;

/// Minimum fix potential for an issue to be handed to the fix tool.
pub const FIXABLE_THRESHOLD: f64 = 0.6;

const BUG_KEYWORDS: &[&str] = &[
    "bug",
    "error",
    "exception",
    "crash",
    "fail",
    "broken",
    "doesn't work",
    "does not work",
];

const FEATURE_KEYWORDS: &[&str] = &[
    "feature",
    "enhancement",
    "request",
    "add",
    "new",
    "improvement",
    "can you add",
    "please add",
    "would be nice",
    "support for",
];

const QUESTION_KEYWORDS: &[&str] = &[
    "question", "how to", "how do", "guidance", "help", "wondering", "?",
];

/// Weight an explicit error marker adds to the bug bucket.
const ERROR_MARKER_BONUS: usize = 2;

/// Bodies shorter than this many words are penalised.
const MIN_DESCRIPTIVE_WORDS: usize = 20;

static ERROR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Error:|Exception:|Traceback").unwrap());

static SPECIFICITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(specific|exact|line|column|function|method)\s+(\d+|name)").unwrap()
});

static HEDGING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(sometimes|intermittent|random|occasionally|rarely|not sure)").unwrap()
});

/// Classifies an issue by keyword voting.
///
/// Each keyword present in the lowercased text counts once toward its
/// bucket. An `Error:`/`Exception:`/`Traceback` marker adds a bonus to the
/// bug bucket. Feature or question wins only with a strict majority;
/// anything else is a bug.
pub fn determine_issue_type(text: &str) -> IssueType {
    let lowered = text.to_lowercase();
    let votes = |keywords: &[&str]| keywords.iter().filter(|k| lowered.contains(*k)).count();

    let mut bug = votes(BUG_KEYWORDS);
    let feature = votes(FEATURE_KEYWORDS);
    let question = votes(QUESTION_KEYWORDS);

    if ERROR_MARKER.is_match(text) {
        bug += ERROR_MARKER_BONUS;
    }

    if feature > bug && feature > question {
        IssueType::Feature
    } else if question > bug && question > feature {
        IssueType::Question
    } else {
        IssueType::Bug
    }
}

/// Scores the likelihood that an automated fix succeeds.
///
/// Non-bug issues always score `0.0`. The score is computed in tenths so the
/// threshold comparison is exact, then clamped to `[0.0, 1.0]`.
///
/// # Arguments
///
/// * `text` - Issue body
/// * `issue_type` - Result of [`determine_issue_type`]
/// * `has_paths` / `has_errors` / `has_code` - Whether extraction found anything
pub fn evaluate_fix_potential(
    text: &str,
    issue_type: IssueType,
    has_paths: bool,
    has_errors: bool,
    has_code: bool,
) -> f64 {
    f64::from(score_tenths(text, issue_type, has_paths, has_errors, has_code)) / 10.0
}

fn score_tenths(
    text: &str,
    issue_type: IssueType,
    has_paths: bool,
    has_errors: bool,
    has_code: bool,
) -> u8 {
    if issue_type != IssueType::Bug {
        return 0;
    }

    let mut score: i32 = 5;
    if has_paths {
        score += 2;
    }
    if has_errors {
        score += 2;
    }
    if has_code {
        score += 1;
    }
    if SPECIFICITY.is_match(text) {
        score += 1;
    }
    if HEDGING.is_match(text) {
        score -= 2;
    }
    if text.split_whitespace().count() < MIN_DESCRIPTIVE_WORDS {
        score -= 2;
    }
    if !text.to_lowercase().contains("reproduce") {
        score -= 1;
    }

    score.clamp(0, 10) as u8
}

/// Analyzes an issue body.
pub fn analyze(text: &str) -> AnalysisResult {
    let file_paths = extract_file_paths(text);
    let error_messages = extract_error_messages(text);
    let code_blocks = extract_code_blocks(text);
    let issue_type = determine_issue_type(text);

    let tenths = score_tenths(
        text,
        issue_type,
        !file_paths.is_empty(),
        !error_messages.is_empty(),
        !code_blocks.is_empty(),
    );
    let fix_potential = f64::from(tenths) / 10.0;

    AnalysisResult {
        issue_type,
        file_paths,
        error_messages,
        code_blocks,
        fix_potential,
        is_fixable: tenths >= 6,
    }
}
