//! Work out where Jira lives from the URL of one of its issues.

use reqwest::Url;

/// The ways Jira is commonly deployed, in the order they are tried.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Deployment {
    /// Jira shares a host with other products under a `/jira` prefix, e.g. `/jira/browse/TST-1`.
    Combined,
    /// Jira has the host to itself, e.g. `/browse/TST-1`.
    Solo,
}

impl Deployment {
    pub const ALL: [Self; 2] = [Self::Combined, Self::Solo];

    const fn browse_prefix(self) -> &'static str {
        match self {
            Self::Combined => "/jira/browse/",
            Self::Solo => "/browse/",
        }
    }

    const fn base_path(self) -> &'static str {
        match self {
            Self::Combined => "/jira",
            Self::Solo => "/",
        }
    }

    /// The endpoint for `issue_url`, if it looks like this kind of deployment.
    pub fn endpoint(self, issue_url: &Url) -> Option<String> {
        if !issue_url.path().starts_with(self.browse_prefix()) {
            return None;
        }
        let host = issue_url.host_str()?;
        let scheme = issue_url.scheme();
        let base_path = self.base_path();
        Some(match issue_url.port() {
            Some(port) => format!("{scheme}://{host}:{port}{base_path}"),
            None => format!("{scheme}://{host}{base_path}"),
        })
    }
}

/// Guess the Jira endpoint from an issue URL, or an empty string if there's no good guess.
pub fn guess(issue_url: Option<&Url>) -> String {
    issue_url
        .and_then(|url| {
            Deployment::ALL
                .into_iter()
                .find_map(|deployment| deployment.endpoint(url))
        })
        .unwrap_or_default()
}
