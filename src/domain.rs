pub mod errors;
pub mod mapper;
pub mod models;
pub mod ports;
pub mod service;

pub use errors::{IdealError, TrustError};
pub use models::{
    AcquirerResponse, Issuer, ProtocolError, RequestIdentity, StatusOutcome, TransactionOutcome,
    TransactionParameters, TransactionStatus,
};
pub use ports::{SigningKey, Transport, TransportError, VerificationKey};
pub use service::Connector;
