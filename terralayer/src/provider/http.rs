//! HTTP client abstraction for testability.

use super::types::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default request timeout for raster fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every tile request.
const USER_AGENT: &str = concat!("terralayer/", env!("CARGO_PKG_VERSION"));

/// Asynchronous HTTP GET abstraction.
///
/// Injected into providers so tests can substitute canned responses for the
/// network.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request, returning the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// [`AsyncHttpClient`] backed by a shared [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout and user agent.
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        debug!(url, "fetching raster tile");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "tile fetch rejected");
            return Err(ProviderError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
