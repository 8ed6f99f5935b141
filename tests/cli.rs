//! Run the `jira-branch` binary against failures that never need a live Jira.

use rstest::rstest;
use snapbox::cmd::{cargo_bin, Command};

const ENV_VARS: [&str; 6] = [
    "JIRA_BRANCH_HELPER_USERNAME",
    "JIRA_BRANCH_HELPER_PASSWORD",
    "JIRA_BRANCH_HELPER_SESSION_USERNAME",
    "JIRA_BRANCH_HELPER_SESSION_PASSWORD",
    "JIRA_BRANCH_HELPER_ENDPOINT",
    "JIRA_BRANCH_HELPER_TEMPLATE",
];

/// `jira-branch` with none of its settings leaking in from the environment.
fn jira_branch() -> Command {
    ENV_VARS
        .into_iter()
        .fold(Command::new(cargo_bin!("jira-branch")), Command::env_remove)
        .env("NO_COLOR", "1")
}

fn stderr_of(command: Command, code: i32) -> String {
    let assert = command.assert().code(code).stdout_eq("");
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[rstest]
#[case::none(&[])]
#[case::two(&["TST-1", "TST-2"])]
fn wrong_number_of_issues(#[case] args: &[&str]) {
    let stderr = stderr_of(jira_branch().args(args), 1);
    assert!(stderr.contains("expected exactly one issue"), "{stderr}");
}

#[test]
fn issue_key_without_endpoint() {
    let stderr = stderr_of(jira_branch().arg("TST-1"), 2);
    assert!(stderr.contains("No Jira endpoint"), "{stderr}");
}

#[test]
fn unrecognised_issue_url_without_endpoint() {
    let stderr = stderr_of(jira_branch().arg("https://example.com/issues/TST-1"), 2);
    assert!(stderr.contains("No Jira endpoint"), "{stderr}");
}

#[test]
fn invalid_endpoint() {
    let stderr = stderr_of(
        jira_branch()
            .arg("TST-1")
            .args(["--jira-endpoint", "not a url"]),
        4,
    );
    assert!(stderr.contains("not a url"), "{stderr}");
}

#[test]
fn issue_url_without_key() {
    let stderr = stderr_of(
        jira_branch()
            .arg("https://example.com/browse/")
            .args(["--jira-endpoint", "http://127.0.0.1:1/"]),
        16,
    );
    assert!(stderr.contains("https://example.com/browse/"), "{stderr}");
}

#[test]
fn malformed_template() {
    let stderr = stderr_of(
        jira_branch()
            .arg("TST-1")
            .args(["--jira-endpoint", "http://127.0.0.1:1/"])
            .args(["--template", "{{ .I am a bo} sdfsdfeef {{ .Broken }}"]),
        8,
    );
    assert!(stderr.contains("template::parse"), "{stderr}");
}

#[test]
fn unreachable_jira() {
    let stderr = stderr_of(jira_branch().arg("http://127.0.0.1:1/browse/TST-1"), 8);
    assert!(stderr.contains("GET http://127.0.0.1:1/rest/api/2/issue/TST-1"), "{stderr}");
}

#[test]
fn help_lists_template_functions() {
    let assert = jira_branch().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for expected in ["KebabCase", "Replace", "JIRA_BRANCH_HELPER_TEMPLATE", "--jira-endpoint"] {
        assert!(stdout.contains(expected), "{expected} missing from {stdout}");
    }
}
