use clap::{command, Arg, ArgMatches, Command};
use log::warn;

use crate::{branch_name::DEFAULT_TEMPLATE, jira::Auth, template::help_text};

const ISSUE: &str = "issue";
const USERNAME: &str = "jira-username";
const PASSWORD: &str = "jira-password";
const SESSION_USERNAME: &str = "jira-session-username";
const SESSION_PASSWORD: &str = "jira-session-password";
const ENDPOINT: &str = "jira-endpoint";
const TEMPLATE: &str = "template";

const ABOUT: &str = "Build a string that can be used for a branch name from the details in a Jira issue";

const LONG_ABOUT: &str = "\
Build a string that can be used for a branch name from the details in a Jira issue

Example usage

    $ jira-branch https://example.com/jira/browse/TST-123
    tst-123-ticket-title-goes-here

    $ jira-branch TST-123 --jira-endpoint https://example.com/jira
    tst-123-ticket-title-goes-here

When given a full issue URL the Jira endpoint is worked out from it, otherwise it must be set \
with --jira-endpoint. Environment variables may be used in place of any option.";

/// The command line interface, ready to parse.
pub fn command() -> Command {
    command!()
        .about(ABOUT)
        .long_about(LONG_ABOUT)
        .after_long_help(template_help())
        .arg(
            Arg::new(ISSUE)
                .value_name("ISSUE-NUMBER OR ISSUE-URL")
                .help("The key of the issue, like TST-123, or a link to it")
                .num_args(0..),
        )
        .arg(
            Arg::new(USERNAME)
                .long(USERNAME)
                .env("JIRA_BRANCH_HELPER_USERNAME")
                .help("The username to authenticate as on Jira"),
        )
        .arg(
            Arg::new(PASSWORD)
                .long(PASSWORD)
                .env("JIRA_BRANCH_HELPER_PASSWORD")
                .hide_env_values(true)
                .help("The password to authenticate as on Jira"),
        )
        .arg(
            Arg::new(SESSION_USERNAME)
                .long(SESSION_USERNAME)
                .env("JIRA_BRANCH_HELPER_SESSION_USERNAME")
                .help("The username to start a cookie session on Jira with"),
        )
        .arg(
            Arg::new(SESSION_PASSWORD)
                .long(SESSION_PASSWORD)
                .env("JIRA_BRANCH_HELPER_SESSION_PASSWORD")
                .hide_env_values(true)
                .help("The password to start a cookie session on Jira with"),
        )
        .arg(
            Arg::new(ENDPOINT)
                .long(ENDPOINT)
                .env("JIRA_BRANCH_HELPER_ENDPOINT")
                .help("Jira's URL"),
        )
        .arg(
            Arg::new(TEMPLATE)
                .long(TEMPLATE)
                .env("JIRA_BRANCH_HELPER_TEMPLATE")
                .default_value(DEFAULT_TEMPLATE)
                .help("The template to use to generate the branch name"),
        )
}

fn template_help() -> String {
    format!(
        "Templates copy text as-is and fill in {{{{ actions }}}}, e.g. {DEFAULT_TEMPLATE}\n\n\
        Actions read a field of the issue and pipe it through functions. The fields are .Key, .ID, \
        .Self, .Fields.Summary, .Fields.Description, .Fields.Type.Name, .Fields.Project.Key, \
        .Fields.Project.Name, .Fields.Status.Name, .Fields.Priority.Name, \
        .Fields.Assignee.DisplayName and .Fields.Reporter.DisplayName\n\n{}",
        help_text()
    )
}

/// Everything the user configured, with empty values treated as unset.
#[derive(Debug)]
pub(crate) struct Options {
    pub(crate) issues: Vec<String>,
    pub(crate) endpoint: Option<String>,
    pub(crate) template: String,
    pub(crate) auth: Auth,
}

impl From<&ArgMatches> for Options {
    fn from(matches: &ArgMatches) -> Self {
        let get = |id: &str| {
            matches
                .get_one::<String>(id)
                .filter(|value| !value.is_empty())
                .cloned()
        };
        let issues = matches
            .get_many::<String>(ISSUE)
            .map(|issues| issues.cloned().collect())
            .unwrap_or_default();
        let auth = match (get(SESSION_USERNAME), get(USERNAME)) {
            (Some(username), basic_username) => {
                if basic_username.is_some() {
                    warn!("Both session and basic credentials were given, using the session");
                }
                Auth::Session {
                    username,
                    password: get(SESSION_PASSWORD).unwrap_or_default(),
                }
            }
            (None, Some(username)) => Auth::Basic {
                username,
                password: get(PASSWORD).unwrap_or_default(),
            },
            (None, None) => Auth::Anonymous,
        };

        Self {
            issues,
            endpoint: get(ENDPOINT),
            template: get(TEMPLATE).unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            auth,
        }
    }
}
