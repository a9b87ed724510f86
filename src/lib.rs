pub mod adapters;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod telemetry;

pub use adapters::http::HttpTransport;
pub use config::{Config, HttpConfig, MerchantConfig};
pub use crypto::{AcquirerCertificate, MerchantKey};
pub use domain::{
    AcquirerResponse, Connector, IdealError, Issuer, ProtocolError, RequestIdentity,
    StatusOutcome, TransactionOutcome, TransactionParameters, TransactionStatus, TrustError,
};
