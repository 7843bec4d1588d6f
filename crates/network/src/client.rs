//! HTTP client wrapper with retries

use crate::error::{NetworkError, NetworkResult};
use crate::retry::RetryPolicy;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Retry policy for idempotent requests
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("Bookshelf/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
            retry_policy: RetryPolicy::new(3).with_initial_delay(Duration::from_millis(100)),
        }
    }
}

/// JSON-over-HTTP client
///
/// GET requests are retried on transport failures and 5xx answers according
/// to the configured policy. Other methods are sent once.
#[derive(Debug, Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches `url` and decodes the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> NetworkResult<T> {
        let parsed = parse_url(url)?;
        let response = self
            .send(url, true, || self.inner.get(parsed.clone()))
            .await?;
        decode(url, response).await
    }

    /// Sends `body` as a JSON PATCH to `url`, discarding any response body
    pub async fn patch_json<B>(&self, url: &str, body: &B) -> NetworkResult<()>
    where
        B: Serialize + ?Sized,
    {
        let parsed = parse_url(url)?;
        self.send(url, false, || self.inner.patch(parsed.clone()).json(body))
            .await?;
        Ok(())
    }

    async fn send<F>(&self, url: &str, idempotent: bool, build: F) -> NetworkResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let policy = &self.config.retry_policy;
        let max_attempts = if idempotent { policy.max_attempts() } else { 1 };
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => NetworkError::Status {
                    status: response.status().as_u16(),
                    url: url.to_string(),
                },
                Err(e) if e.is_timeout() => NetworkError::Timeout,
                Err(e) => NetworkError::Http(e),
            };

            if attempt >= max_attempts || !error.is_retryable() {
                return Err(error);
            }

            let delay = policy.delay_for_attempt(attempt);
            log::warn!(
                "Request to {} failed (attempt {}/{}): {}; retrying in {:?}",
                url,
                attempt,
                max_attempts,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn parse_url(url: &str) -> NetworkResult<Url> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))
}

async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> NetworkResult<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| NetworkError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
