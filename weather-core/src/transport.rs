//! One-shot HTTP transport.
//!
//! A [`Transport`] performs exactly one request and hands back the raw status
//! and body. It never interprets the body and never retries.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header::HeaderMap};
use thiserror::Error;

/// Fully-formed outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl HttpRequest {
    pub fn get(url: Url, headers: HeaderMap) -> Self {
        Self { method: Method::GET, url, headers }
    }
}

/// Raw response as received from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, TLS, timeout, cancellation or any other failure of the call itself.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The peer answered with something that is not a status + body pair.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let res = self
            .http
            .request(request.method, request.url)
            .headers(request.headers)
            .send()
            .await?;

        let status = res.status().as_u16();
        let body = res.bytes().await.map_err(|err| {
            if err.is_decode() || err.is_body() {
                TransportError::Malformed(err.to_string())
            } else {
                TransportError::Http(err)
            }
        })?;

        Ok(HttpResponse { status, body: body.to_vec() })
    }
}
