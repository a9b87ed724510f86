//! XML signatures for acquirer messages
//!
//! 1. Outgoing requests: enveloped RSA-SHA256 signature identified by the merchant certificate thumbprint
//! 2. Incoming responses: verification of the acquirer's signature over `SignedInfo`

pub mod constants;
pub mod signer;
pub mod validator;
pub mod writer;

pub use signer::XmlSignatureSigner;
pub use validator::XmlSignatureValidator;
pub use writer::{CanonicalWriter, WriteError};
