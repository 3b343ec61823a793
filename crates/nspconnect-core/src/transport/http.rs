//! reqwest-backed `Transport`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use super::{ApiRequest, ApiResponse, Auth, Body, Method, Transport};
use crate::config::Config;
use crate::error::TransportError;

/// HTTP transport for NSP.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    scheme: String,
}

impl HttpTransport {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            &config.scheme,
            config.request_timeout(),
            config.accept_invalid_certs,
        )
    }

    fn build(scheme: &str, timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            scheme: scheme.to_string(),
        })
    }

    fn url(&self, request: &ApiRequest) -> String {
        format!("{}://{}{}", self.scheme, request.host, request.path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url(&request);
        debug!(method = ?request.method, url = %url, "Sending NSP request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        builder = builder.header(header::ACCEPT, "application/json");

        builder = match request.auth {
            Auth::None => builder,
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::Bearer(token) => builder.bearer_auth(token),
        };

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, url = %url, "NSP response received");
        Ok(ApiResponse { status, body })
    }
}
