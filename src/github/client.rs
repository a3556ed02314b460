//! HTTP transport for the GitHub REST API
//!
//! Every request carries the bearer token, the v3 media type and a
//! User-Agent. Non-success responses become [`GithubError::RequestFailed`]
//! carrying GitHub's own `message` when the body has one.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{GithubError, Result};

use super::types::ErrorBody;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Authenticated GitHub API client
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
}

impl GithubClient {
    /// Create a client for `token` using the API settings in `config`
    pub fn new(config: &Config, token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GithubError::MissingToken.into());
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| GithubError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(crate::APP_NAME)),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub(crate) fn patch(&self, path: &str) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    /// Send a request; only transport failures are errors here
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(GithubError::from)?;
        debug!("{} {}", response.status(), response.url().path());
        Ok(response)
    }

    /// Send a request and decode a successful JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(failure(response, context).await.into());
        }
        Ok(response.json::<T>().await.map_err(GithubError::from)?)
    }
}

/// Percent-encode each segment of a `/`-separated file path or branch name
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn an unsuccessful response into the generic request failure
pub(crate) async fn failure(response: Response, context: &str) -> GithubError {
    let status = response.status();
    let message = match response.text().await {
        Ok(body) => serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            }),
        Err(_) => "Unknown error".to_string(),
    };
    GithubError::request_failed(context, message)
}
