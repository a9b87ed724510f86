//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::domain::ports::{Transport, TransportError};

pub const USER_AGENT: &str = concat!("ideal-connector/", env!("CARGO_PKG_VERSION"));
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        if config.timeout_secs == 0 {
            return Err(TransportError::Setup("Timeout must be greater than zero".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .use_rustls_tls()
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self { client })
    }

    /// Use a preconfigured client, for proxies or custom root certificates
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        debug!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {url} failed: {e}");
                TransportError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Acquirer at {url} answered {status}");
            return Err(TransportError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        debug!("Received {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
