//! Request builders for the WP.com REST API.
//!
//! Every family client resolves one request into a typed response payload
//! (`*_payload`), and has a fire-and-forget twin that spawns the request and
//! dispatches the payload tagged with the originating action.

mod auth;
mod comments;
mod reader;
mod taxonomy;

pub use auth::AuthRestClient;
pub use comments::CommentRestClient;
pub use reader::{ReaderRestClient, SEARCH_PAGE_SIZE};
pub use taxonomy::TaxonomyRestClient;

use std::time::Duration;

use domain::{protocol::ErrorEnvelope, BaseNetworkError, GenericErrorType};
use reqwest::{RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://public-api.wordpress.com/rest/";

#[derive(Debug, Clone)]
pub struct RestClientConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct WpComRestClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl WpComRestClient {
    pub fn new(config: RestClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("wpclient/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            access_token: config.access_token.filter(|t| !t.is_empty()),
        })
    }

    /// Joins path segments onto the base url, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, BaseNetworkError> {
        let request = self.http.get(self.url(segments)).query(query);
        self.send(request).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, BaseNetworkError> {
        let request = self.http.post(self.url(segments)).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BaseNetworkError> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(map_error_response(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| BaseNetworkError {
            kind: GenericErrorType::ParseError,
            message: e.to_string(),
            status: Some(status.as_u16()),
            api_error: None,
        })
    }
}

pub fn map_transport_error(error: reqwest::Error) -> BaseNetworkError {
    let kind = if error.is_timeout() {
        GenericErrorType::Timeout
    } else if error.is_connect() {
        GenericErrorType::NoConnection
    } else if error.is_decode() {
        GenericErrorType::ParseError
    } else {
        GenericErrorType::Unknown
    };
    BaseNetworkError {
        kind,
        message: error.to_string(),
        status: error.status().map(|s| s.as_u16()),
        api_error: None,
    }
}

/// Maps a non-2xx response into a network error, reading the
/// `{"error": code, "message": text}` envelope when the body has one.
pub fn map_error_response(status: u16, body: &str) -> BaseNetworkError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let auth_code = matches!(
        envelope.error.as_deref(),
        Some("authorization_required") | Some("unauthorized")
    );
    let kind = match status {
        401 | 403 => GenericErrorType::AuthorizationRequired,
        _ if auth_code => GenericErrorType::AuthorizationRequired,
        404 => GenericErrorType::NotFound,
        500..=599 => GenericErrorType::ServerError,
        _ => GenericErrorType::Unknown,
    };
    let message = envelope
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));
    BaseNetworkError {
        kind,
        message,
        status: Some(status),
        api_error: envelope.error,
    }
}
