//! Remote weather client: builds the fixed request, sends it through a
//! [`Transport`] and maps the answer.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use reqwest::{
    Url,
    header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue},
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    mapper::{self, MapError},
    model::WeatherReading,
    transport::{HttpRequest, HttpResponse, Transport, TransportError},
};

const API_KEY_HEADER: &str = "x-rapidapi-key";
const API_HOST_HEADER: &str = "x-rapidapi-host";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("could not reach the weather service")]
    Connectivity,
    #[error("the weather service rejected the request")]
    InvalidRequest,
    #[error("the weather service returned unexpected data")]
    InvalidData,
}

impl ClientError {
    /// Alert text shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::Connectivity => "Check your connection to internet.",
            ClientError::InvalidRequest => "APIKey expired.",
            ClientError::InvalidData => {
                "Ups! something changed on the Weather service. Please try again later."
            }
        }
    }
}

impl From<MapError> for ClientError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::InvalidRequest { .. } => ClientError::InvalidRequest,
            MapError::InvalidData(_) => ClientError::InvalidData,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(_: TransportError) -> Self {
        ClientError::Connectivity
    }
}

/// Rejected client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint URL '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid value for header {name}: {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },
}

#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    /// Fetches the current reading for the configured location.
    async fn request_current(&self) -> Result<WeatherReading, ClientError>;
}

#[derive(Debug)]
pub struct RemoteWeatherClient {
    endpoint: Url,
    headers: HeaderMap,
    transport: Arc<dyn Transport>,
}

impl RemoteWeatherClient {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(&config.endpoint_url).map_err(|source| {
            ConfigError::InvalidEndpoint { url: config.endpoint_url.clone(), source }
        })?;

        let mut api_key = header_value(API_KEY_HEADER, &config.api_key)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
        headers.insert(
            HeaderName::from_static(API_HOST_HEADER),
            header_value(API_HOST_HEADER, &config.api_host)?,
        );

        Ok(Self { endpoint, headers, transport })
    }

    fn build_request(&self) -> HttpRequest {
        HttpRequest::get(self.endpoint.clone(), self.headers.clone())
    }

    fn interpret(
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<WeatherReading, ClientError> {
        let response = outcome.map_err(|err| {
            warn!(error = %err, "weather request failed in transport");
            ClientError::from(err)
        })?;

        debug!(status = response.status, bytes = response.body.len(), "weather response received");

        mapper::map(&response.body, response.status).map_err(|err| {
            warn!(error = %err, "weather response could not be mapped");
            ClientError::from(err)
        })
    }

    /// Spawns a request and hands its result to `on_complete`.
    ///
    /// The callback runs at most once, and never if every strong handle to
    /// the client was dropped before the transport answered.
    pub fn request_with<F>(self: &Arc<Self>, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<WeatherReading, ClientError>) + Send + 'static,
    {
        let client = Arc::downgrade(self);
        let transport = Arc::clone(&self.transport);
        let request = self.build_request();
        debug!(url = %request.url, "spawning weather request");

        tokio::spawn(async move {
            let outcome = transport.send(request).await;

            if client.upgrade().is_none() {
                debug!("weather client disposed; dropping response");
                return;
            }

            on_complete(Self::interpret(outcome));
        })
    }
}

#[async_trait]
impl WeatherClient for RemoteWeatherClient {
    async fn request_current(&self) -> Result<WeatherReading, ClientError> {
        let request = self.build_request();
        debug!(url = %request.url, "requesting current weather");
        Self::interpret(self.transport.send(request).await)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|source| ConfigError::InvalidHeader { name, source })
}
