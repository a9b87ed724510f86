//! Ports (interfaces) to the collaborators the connector relies on.
//! Key material and the network are supplied by the caller; the connector never
//! reads key files or opens sockets itself.

use async_trait::async_trait;

use crate::crypto;

/// Errors raised by a [`Transport`]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request to acquirer failed: {0}")]
    Request(String),

    #[error("Acquirer answered with HTTP status {0}")]
    Status(u16),

    #[error("Failed to read acquirer response: {0}")]
    Body(String),

    #[error("Failed to set up HTTP client: {0}")]
    Setup(String),
}

/// Sends one signed document and returns the complete response body
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as `text/xml` to `url`
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The full response body of a 2xx response
    /// * `Err(TransportError)` - Connection failure, timeout or non-2xx status
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

/// The merchant's signing capability
pub trait SigningKey: Send + Sync {
    /// Identifier placed in `KeyInfo/KeyName`, the certificate thumbprint
    fn key_name(&self) -> &str;

    /// RSA-SHA256 PKCS#1 v1.5 signature over `data`
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, crypto::Error>;
}

/// The acquirer's verification capability
pub trait VerificationKey: Send + Sync {
    /// Check an RSA-SHA256 PKCS#1 v1.5 `signature` over `data`
    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, crypto::Error>;
}
