//! Shared HTTP plumbing for the backend adapters

use crate::config::{ApiConfig, ConsoleConfig};
use crate::error::{common, ConsoleError, ErrorCode, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

/// Raw reply of a backend call that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx reply into a transport error for `endpoint`
    pub fn error_for_status(self, endpoint: &Url) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(common::http_status(endpoint.as_str(), self.status, &self.body))
        }
    }
}

/// Configured `reqwest` client plus the identity headers every call carries
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    api: ApiConfig,
    user_id: String,
}

impl BackendClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        config.api.validate()?;

        let mut builder = Client::builder().user_agent(concat!("opsdesk/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.api.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            ConsoleError::transport_with_code(
                ErrorCode::TRANSPORT_CLIENT_BUILD,
                "Failed to create HTTP client",
                None,
            )
            .with_source(e)
        })?;

        Ok(Self {
            client,
            api: config.api.clone(),
            user_id: config.user_id.clone(),
        })
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(USER_ID_HEADER, &self.user_id)
            .header(IDEMPOTENCY_HEADER, Uuid::new_v4().to_string());
        match &self.api.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get(&self, url: Url) -> Result<RawResponse> {
        debug!(url = %url, "GET");
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<RawResponse> {
        debug!(url = %url, "POST");
        self.send(self.request(Method::POST, url).json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<RawResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        trace!(status, bytes = body.len(), "Backend replied");
        Ok(RawResponse { status, body })
    }
}
