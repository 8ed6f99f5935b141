use log::debug;
use miette::Diagnostic;
use percent_encoding::percent_decode_str;
use reqwest::Url;

/// How to read the issue the user asked for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IssueReference {
    /// The argument is already an issue key, like `TST-123`.
    Literal,
    /// The argument is a link to the issue, like `https://example.com/browse/TST-123`.
    Url,
}

impl IssueReference {
    /// Anything that parsed as a URL with a host is a link, everything else is a key.
    pub fn detect(issue_url: Option<&Url>) -> Self {
        match issue_url.and_then(Url::host_str) {
            Some(host) if !host.is_empty() => Self::Url,
            _ => Self::Literal,
        }
    }

    /// Get the issue key out of `raw`.
    ///
    /// # Errors
    ///
    /// For [`Self::Url`], if `raw` isn't a URL with a host and a final path segment.
    pub fn issue_key(self, raw: &str) -> Result<String, Error> {
        match self {
            Self::Literal => Ok(raw.to_string()),
            Self::Url => {
                let url = Url::parse(raw).map_err(|err| Error::InvalidUrl {
                    url: raw.to_string(),
                    reason: err.to_string(),
                })?;
                if url.host_str().map_or(true, str::is_empty) {
                    return Err(Error::NoHost(raw.to_string()));
                }
                let key = url
                    .path_segments()
                    .and_then(|segments| segments.last())
                    .filter(|segment| !segment.is_empty())
                    .ok_or_else(|| Error::NoIssueKey(raw.to_string()))?;
                let key = percent_decode_str(key)
                    .decode_utf8()
                    .map_err(|err| Error::InvalidUrl {
                        url: raw.to_string(),
                        reason: err.to_string(),
                    })?;
                debug!("Using issue key {key} from {url}");
                Ok(key.into_owned())
            }
        }
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("The issue URL {url} is invalid: {reason}")]
    #[diagnostic(
        code(issue_reference::invalid_url),
        help("Pass either an issue key like TST-123 or the full URL of the issue")
    )]
    InvalidUrl { url: String, reason: String },
    #[error("No host provided in {0}, not a valid URL")]
    #[diagnostic(
        code(issue_reference::no_host),
        help("Issue URLs look like https://example.com/browse/TST-123")
    )]
    NoHost(String),
    #[error("Could not find an issue key at the end of {0}")]
    #[diagnostic(
        code(issue_reference::no_issue_key),
        help("Issue URLs end with the issue key, like https://example.com/browse/TST-123")
    )]
    NoIssueKey(String),
}

#[cfg(test)]
mod test_issue_reference {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("TST-123")]
    #[case("https://example.com/browse/TST-123")]
    #[case("Not an issue?")]
    #[case("")]
    fn literal_is_identity(#[case] raw: &str) {
        assert_eq!(IssueReference::Literal.issue_key(raw).unwrap(), raw);
    }

    #[rstest]
    #[case("https://example.com/browse/TST-123")]
    #[case("https://example.com/jira/browse/TST-123")]
    #[case("https://example.com/browse/TST-123?focusedCommentId=1#comment")]
    #[case("http://localhost:8080/browse/TST-123")]
    fn url_takes_last_segment(#[case] raw: &str) {
        assert_eq!(IssueReference::Url.issue_key(raw).unwrap(), "TST-123");
    }

    #[rstest]
    #[case("https://example.com/browse/TST%2D123", "TST-123")]
    #[case("https://example.com/browse/T%C3%84ST-1", "TÄST-1")]
    fn url_key_is_decoded(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(IssueReference::Url.issue_key(raw).unwrap(), expected);
    }

    #[test]
    fn url_rejects_key_that_is_not_utf8() {
        let err = IssueReference::Url
            .issue_key("https://example.com/browse/TST%FF1")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn url_rejects_non_url() {
        let err = IssueReference::Url.issue_key("Not an issue?").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn url_rejects_missing_host() {
        let err = IssueReference::Url.issue_key("mailto:TST-123").unwrap_err();
        assert!(matches!(err, Error::NoHost(_)));
    }

    #[test]
    fn url_rejects_missing_key() {
        let err = IssueReference::Url
            .issue_key("https://example.com/browse/")
            .unwrap_err();
        assert!(matches!(err, Error::NoIssueKey(_)));
    }

    #[test]
    fn detect_without_url() {
        assert_eq!(IssueReference::detect(None), IssueReference::Literal);
    }

    #[rstest]
    #[case("https://example.com/jira/TST-101", IssueReference::Url)]
    #[case("mailto:someone@example.com", IssueReference::Literal)]
    #[case("tst:123", IssueReference::Literal)]
    fn detect_from_url(#[case] raw: &str, #[case] expected: IssueReference) {
        let url = Url::parse(raw).unwrap();
        assert_eq!(IssueReference::detect(Some(&url)), expected);
    }
}
