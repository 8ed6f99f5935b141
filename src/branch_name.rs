use log::debug;
use miette::Diagnostic;

use crate::{
    jira::{ApiError, IssueSource},
    template::{ExecError, ParseError, Template},
};

/// Used when no template is configured.
pub const DEFAULT_TEMPLATE: &str = "{{.Key | ToLower }}-{{.Fields.Summary | Trim | KebabCase }}";

/// Fetch the issue with `issue_key` and render `template` against it.
///
/// Takes an already parsed template so that a broken one is reported before Jira is contacted.
pub(crate) async fn format_issue(
    jira: &impl IssueSource,
    issue_key: &str,
    template: &Template,
) -> Result<String, Error> {
    let issue = jira.get_issue(issue_key).await?;
    debug!("Fetched {}: {}", issue.key, issue.fields.summary);
    Ok(template.render(&issue)?)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] ParseError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Jira(#[from] ApiError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] ExecError),
}
