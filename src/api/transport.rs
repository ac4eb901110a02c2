//! HTTP transport abstraction.
//!
//! The executor talks to the network through the `Transport` trait so its
//! retry and failure-classification logic can be exercised against scripted
//! responses. `HttpTransport` is the production implementation over a shared
//! `reqwest` client; the connection pool lives for one audit run.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use anyhow::{Context, Result};

/// HTTP method for an API request. The Eyeris API only needs these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Request body variants used by the API.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// One outbound API request, fully described before any attempt is made.
///
/// The executor may send the same request several times; nothing in here is
/// consumed by a send.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            bearer: None,
            body: Some(RequestBody::Json(body)),
        }
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            bearer: None,
            body: Some(RequestBody::Form(fields)),
        }
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

/// Status and body of a completed HTTP exchange.
///
/// The transport never interprets the status; classification belongs to the
/// executor.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failure: refused, timeout, DNS, TLS.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends one request and reports what came back, nothing more.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Production transport over a pooled `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        builder = builder.header(reqwest::header::ACCEPT, "application/json");

        if let Some(ref bearer) = request.bearer {
            builder = builder.bearer_auth(bearer);
        }

        match request.body {
            Some(RequestBody::Json(ref value)) => builder = builder.json(value),
            Some(RequestBody::Form(ref fields)) => builder = builder.form(fields),
            None => {}
        }

        let response = builder.send().await.map_err(describe_send_error)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("Failed to read response body: {e}")))?;

        Ok(RawResponse { status, body })
    }
}

fn describe_send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError("Request timed out".to_string())
    } else if err.is_connect() {
        TransportError(format!("Connection failed: {err}"))
    } else {
        TransportError(format!("Request failed: {err}"))
    }
}
