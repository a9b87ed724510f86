use thiserror::Error;

use super::ports::TransportError;
use crate::adapters::xml_signature::WriteError;
use crate::crypto;

/// Why a response could not be trusted
#[derive(Error, Debug)]
pub enum TrustError {
    #[error("Response carries no signature")]
    MissingSignature,

    #[error("Response signature does not verify against the acquirer certificate")]
    InvalidSignature,

    #[error("Response signature is malformed: {0}")]
    MalformedSignature(String),

    #[error("Acquirer key failed: {0}")]
    Key(#[from] crypto::Error),
}

/// Fatal outcome of an operation.
///
/// A business-level rejection by the acquirer is not an `IdealError`; it is
/// returned as [`AcquirerResponse::Error`](super::models::AcquirerResponse).
#[derive(Error, Debug)]
pub enum IdealError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Untrusted response: {0}")]
    Trust(#[from] TrustError),

    #[error("Failed to sign request: {0}")]
    Signing(#[source] crypto::Error),

    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<WriteError> for IdealError {
    fn from(error: WriteError) -> Self {
        IdealError::Serialization(error.to_string())
    }
}
