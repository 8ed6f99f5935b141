use std::fmt::Write;

use base64::{prelude::BASE64_STANDARD as base64, Engine};
use log::debug;
use miette::Diagnostic;
use reqwest::{header, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use crate::template::{Context, Field};

/// Anything that can look up a Jira issue by its key.
pub(crate) trait IssueSource {
    async fn get_issue(&self, key: &str) -> Result<Issue, ApiError>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct Issue {
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default, rename = "self")]
    pub(crate) self_url: String,
    #[serde(default)]
    pub(crate) fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IssueFields {
    #[serde(default)]
    pub(crate) summary: String,
    pub(crate) description: Option<String>,
    #[serde(rename = "issuetype")]
    pub(crate) issue_type: Option<Named>,
    pub(crate) project: Option<Project>,
    pub(crate) status: Option<Named>,
    pub(crate) priority: Option<Named>,
    pub(crate) assignee: Option<User>,
    pub(crate) reporter: Option<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Named {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Project {
    pub(crate) key: String,
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct User {
    pub(crate) display_name: String,
}

impl Context for Issue {
    fn field(&self, path: &[String]) -> Field<'_> {
        let path = path.iter().map(String::as_str).collect::<Vec<_>>();
        let fields = &self.fields;
        let value = match path.as_slice() {
            ["Key"] => Some(self.key.as_str()),
            ["ID"] => Some(self.id.as_str()),
            ["Self"] => Some(self.self_url.as_str()),
            ["Fields", "Summary"] => Some(fields.summary.as_str()),
            ["Fields", "Description"] => fields.description.as_deref(),
            ["Fields", "Type", "Name"] => fields.issue_type.as_ref().map(|it| it.name.as_str()),
            ["Fields", "Project", "Key"] => fields.project.as_ref().map(|it| it.key.as_str()),
            ["Fields", "Project", "Name"] => fields.project.as_ref().map(|it| it.name.as_str()),
            ["Fields", "Status", "Name"] => fields.status.as_ref().map(|it| it.name.as_str()),
            ["Fields", "Priority", "Name"] => fields.priority.as_ref().map(|it| it.name.as_str()),
            ["Fields", "Assignee", "DisplayName"] => {
                fields.assignee.as_ref().map(|it| it.display_name.as_str())
            }
            ["Fields", "Reporter", "DisplayName"] => {
                fields.reporter.as_ref().map(|it| it.display_name.as_str())
            }
            _ => return Field::Unknown,
        };
        value.map_or(Field::NoValue, Field::Text)
    }
}

/// How to authenticate with Jira.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum Auth {
    #[default]
    Anonymous,
    /// Send the credentials with every request.
    Basic { username: String, password: String },
    /// Log in once and send the session cookie.
    Session { username: String, password: String },
}

pub(crate) struct Client {
    http: reqwest::Client,
    /// Always ends in `/` so API paths can be joined onto it.
    endpoint: Url,
    authorization: Option<String>,
    cookie: Option<String>,
}

impl Client {
    /// Build a client for the Jira instance at `endpoint`, logging in first if `auth` asks for a
    /// session.
    pub(crate) async fn connect(endpoint: &str, auth: Auth) -> Result<Self, Error> {
        let mut endpoint = Url::parse(endpoint).map_err(|err| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: String::from("not a base URL"),
            });
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpClient)?;

        let mut client = Self {
            http,
            endpoint,
            authorization: None,
            cookie: None,
        };
        match auth {
            Auth::Anonymous => {}
            Auth::Basic { username, password } => {
                client.authorization = Some(format!(
                    "Basic {}",
                    base64.encode(format!("{username}:{password}"))
                ));
            }
            Auth::Session { username, password } => {
                client.cookie = Some(client.login(&username, &password).await?);
            }
        }
        Ok(client)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.endpoint
            .join(path)
            .map_err(|err| ApiError::new("building the request", err.to_string()))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(header::ACCEPT, "application/json");
        let builder = match &self.authorization {
            Some(authorization) => builder.header(header::AUTHORIZATION, authorization),
            None => builder,
        };
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    /// Start a cookie based session, returning the cookie to send with later requests.
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = self.url("rest/auth/1/session")?;
        let builder = self
            .http
            .post(url)
            .json(&json!({"username": username, "password": password}));
        let response: SessionResponse = self.send(builder, "logging in").await?;
        let SessionInfo { name, value } = response.session;
        debug!("Started a Jira session, sending the {name} cookie");
        Ok(format!("{name}={value}"))
    }

    /// Send a request, decoding a successful JSON response as `T`.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        activity: &'static str,
    ) -> Result<T, ApiError> {
        let request = self
            .request(builder)
            .build()
            .map_err(|err| ApiError::new(activity, err.to_string()))?;
        let request_line = format!("{} {}", request.method(), request.url());
        debug!("{request_line}");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| {
                ApiError::new(activity, err.to_string()).with_exchange(request_line.clone())
            })?;
        let status = response.status();
        let head = response_head(&response);
        let body = response.text().await.map_err(|err| {
            ApiError::new(activity, err.to_string())
                .with_exchange(format!("{request_line}\n\n{head}"))
        })?;
        let exchange = || format!("{request_line}\n\n{head}\n\n{body}");

        if !status.is_success() {
            return Err(
                ApiError::new(activity, format!("Jira responded with {status}"))
                    .with_exchange(exchange()),
            );
        }
        serde_json::from_str(&body).map_err(|err| {
            ApiError::new(activity, format!("could not decode the response: {err}"))
                .with_exchange(exchange())
        })
    }
}

impl IssueSource for Client {
    async fn get_issue(&self, key: &str) -> Result<Issue, ApiError> {
        let mut url = self.url("rest/api/2/issue")?;
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::new("building the request", "the endpoint can't have a path")
            })?
            .push(key);
        self.send(self.http.get(url), "getting the issue").await
    }
}

/// The status line and headers of `response`.
fn response_head(response: &Response) -> String {
    let mut head = format!("{:?} {}", response.version(), response.status());
    for (name, value) in response.headers() {
        let value = value.to_str().unwrap_or("<binary>");
        let _ = write!(head, "\n{name}: {value}");
    }
    head
}

#[derive(Deserialize, Debug)]
struct SessionResponse {
    session: SessionInfo,
}

#[derive(Deserialize, Debug)]
struct SessionInfo {
    name: String,
    value: String,
}

/// A request to Jira failed, with as much of the exchange as we have for debugging.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Problem communicating with Jira while {activity}: {reason}")]
#[diagnostic(code(jira::api))]
pub(crate) struct ApiError {
    activity: &'static str,
    reason: String,
    #[help]
    exchange: Option<String>,
}

impl ApiError {
    pub(crate) fn new(activity: &'static str, reason: impl Into<String>) -> Self {
        Self {
            activity,
            reason: reason.into(),
            exchange: None,
        }
    }

    /// Attach the request (and response, if there was one) for debugging.
    fn with_exchange(mut self, exchange: String) -> Self {
        self.exchange = Some(exchange);
        self
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("The Jira endpoint {endpoint} is invalid: {reason}")]
    #[diagnostic(
        code(jira::invalid_endpoint),
        help("The endpoint is the base URL of Jira, like https://example.com/jira/")
    )]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("Could not create an HTTP client: {0}")]
    #[diagnostic(code(jira::http_client))]
    HttpClient(#[source] reqwest::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Login(#[from] ApiError),
}
