use openssl::error::ErrorStack;
use thiserror::Error;

pub(crate) type CryptoResult<T> = Result<T, Error>;

/// Error type for key handling, signing and verification
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or unsupported key material
    #[error("Invalid key material: {0}")]
    Invalid(String),

    /// Certificate outside its validity period
    #[error("Certificate is not valid: {0}")]
    CertificateValidity(String),

    /// Internal OpenSSL error
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] ErrorStack),
}
