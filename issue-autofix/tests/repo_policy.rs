use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use issue_autofix::fix_tool::select_target_files;
use issue_autofix::{should_process, LabelDecision, RepoConfig};
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/policies")
        .join(name);
    fs::read_to_string(path).unwrap()
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn custom_policy_is_parsed() {
    let config = RepoConfig::parse(&fixture("custom.yml")).unwrap();

    assert_eq!(config.labels.process, vec!["autofix"]);
    assert_eq!(config.labels.ignore, vec!["needs-design"]);
    assert_eq!(config.files.exclude, vec!["src/vendored/**"]);
    assert!(config.pr.draft);
    assert_eq!(config.pr.reviewers, vec!["octocat"]);
    assert_eq!(config.pr.labels, vec!["automated", "bot"]);
}

#[test]
fn custom_policy_filters_labels() {
    let config = RepoConfig::parse(&fixture("custom.yml")).unwrap();

    assert_eq!(
        should_process(&labels(&["autofix"]), &config.labels),
        LabelDecision::Process
    );
    assert!(!should_process(&labels(&["bug"]), &config.labels).is_process());
    assert!(!should_process(&labels(&["autofix", "needs-design"]), &config.labels).is_process());
}

#[test]
fn misspelled_key_falls_back_to_defaults() {
    let contents = fixture("typo.yml");

    assert!(RepoConfig::parse(&contents).is_err());
    assert_eq!(RepoConfig::parse_or_default(&contents), RepoConfig::default());
}

#[test]
fn custom_policy_selects_target_files() {
    let config = RepoConfig::parse(&fixture("custom.yml")).unwrap();
    let repo = TempDir::new().unwrap();
    for file in ["src/app.py", "src/vendored/six.py", "docs/guide.md"] {
        let path = repo.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "pass\n").unwrap();
    }

    let targets = select_target_files(repo.path(), &BTreeSet::new(), &config.files).unwrap();

    assert_eq!(targets, vec!["src/app.py"]);
}
