use std::io::{stdout, Write};

use clap::ArgMatches;
use log::debug;
use miette::Diagnostic;
use reqwest::Url;

pub use crate::cli::command;
use crate::{cli::Options, issue_reference::IssueReference, template::Template};

mod branch_name;
pub mod case;
mod cli;
pub mod endpoint;
pub mod issue_reference;
mod jira;
pub mod template;

/// Print the branch name for the single issue in `matches`.
///
/// # Errors
///
/// Every failure is terminal, see [`Error::exit_code`] for how they map to exit codes.
pub async fn run(matches: &ArgMatches) -> Result<(), Error> {
    let branch_name = build_branch_name(matches).await?;
    write_branch_name(&mut stdout().lock(), &branch_name)
}

async fn build_branch_name(matches: &ArgMatches) -> Result<String, Error> {
    let Options {
        issues,
        endpoint,
        template,
        auth,
    } = Options::from(matches);
    let [raw_issue] = issues.as_slice() else {
        return Err(Error::ArgumentCount(issues.len()));
    };

    let issue_url = Url::parse(raw_issue).ok();
    let issue_reference = IssueReference::detect(issue_url.as_ref());
    let endpoint = match endpoint {
        Some(endpoint) if endpoint.ends_with('/') => endpoint,
        Some(endpoint) => format!("{endpoint}/"),
        None => {
            let guessed = endpoint::guess(issue_url.as_ref());
            if guessed.is_empty() {
                return Err(Error::NoEndpoint);
            }
            guessed
        }
    };
    debug!("Using the Jira instance at {endpoint}");

    // Nothing may touch the network until the template parses, logging in included.
    let template = Template::parse(template).map_err(branch_name::Error::from)?;
    let client = jira::Client::connect(&endpoint, auth).await?;
    let issue_key = issue_reference.issue_key(raw_issue)?;
    Ok(branch_name::format_issue(&client, &issue_key, &template).await?)
}

fn write_branch_name(output: &mut impl Write, branch_name: &str) -> Result<(), Error> {
    writeln!(output, "{branch_name}").map_err(Error::Stdout)?;
    output.flush().map_err(Error::Stdout)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Incorrect number of arguments, expected exactly one issue but got {0}")]
    #[diagnostic(
        code(arguments),
        help("See `jira-branch --help` for full usage information")
    )]
    ArgumentCount(usize),
    #[error("No Jira endpoint was provided")]
    #[diagnostic(
        code(no_endpoint),
        help(
            "Provide Jira's URL with --jira-endpoint or JIRA_BRANCH_HELPER_ENDPOINT, or pass a full issue URL"
        )
    )]
    NoEndpoint,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Jira(#[from] jira::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    IssueReference(#[from] issue_reference::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    BranchName(#[from] branch_name::Error),
    #[error("Unable to write to stdout: {0}")]
    #[diagnostic(code(stdout))]
    Stdout(#[source] std::io::Error),
}

impl Error {
    /// Each kind of failure gets its own bit.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ArgumentCount(_) => 1,
            Self::NoEndpoint => 2,
            Self::Jira(_) => 4,
            Self::BranchName(_) => 8,
            Self::IssueReference(_) => 16,
            Self::Stdout(_) => 32,
        }
    }
}
