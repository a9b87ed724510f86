use std::{fmt, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::ports::{SigningKey, VerificationKey};
use crate::config::MerchantConfig;

/// Everything an operation needs to know about who is calling.
///
/// Built per call. The key handles are read-only and may be shared between
/// concurrent operations.
#[derive(Clone)]
pub struct RequestIdentity {
    pub merchant: MerchantConfig,
    pub signing_key: Arc<dyn SigningKey>,
    pub acquirer_key: Arc<dyn VerificationKey>,
}

impl RequestIdentity {
    pub fn new(
        merchant: MerchantConfig,
        signing_key: Arc<dyn SigningKey>,
        acquirer_key: Arc<dyn VerificationKey>,
    ) -> Self {
        Self {
            merchant,
            signing_key,
            acquirer_key,
        }
    }
}

impl fmt::Debug for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestIdentity")
            .field("merchant", &self.merchant)
            .field("signing_key", &self.signing_key.key_name())
            .field("acquirer_key", &"<VerificationKey>")
            .finish()
    }
}

/// A participating consumer bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// Bank identifier code, for example `INGBNL2A`
    pub id: String,
    /// Name to show in the merchant's issuer list
    pub name: String,
}

/// Payment details for an `AcquirerTrxReq`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParameters {
    /// Where the issuer sends the consumer back to after authorisation
    pub return_url: String,
    /// Amount in euro, rendered with exactly two decimals
    pub amount: Decimal,
    pub description: String,
    /// Merchant chosen token carried through the issuer redirect
    pub entrance_code: String,
    /// Order reference within the merchant's system
    pub purchase_id: String,
}

impl TransactionParameters {
    /// Fresh entrance code: 32 lower-case hex characters
    pub fn new_entrance_code() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Answer to a successful `AcquirerTrxReq`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    /// Redirect target for the consumer, entity-decoded
    pub issuer_authentication_url: String,
    /// 16-digit identifier assigned by the acquirer
    pub transaction_id: String,
    pub transaction_create_timestamp: String,
    /// Echo of the purchase identifier sent in the request
    pub purchase_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Positive result; the payment is guaranteed
    Success,
    Cancelled,
    Expired,
    Failure,
    /// Final result not yet known, ask again later
    Open,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "Success",
            TransactionStatus::Cancelled => "Cancelled",
            TransactionStatus::Expired => "Expired",
            TransactionStatus::Failure => "Failure",
            TransactionStatus::Open => "Open",
        }
    }

    /// Whether a later status request can still change the outcome
    pub fn is_final(&self) -> bool {
        !matches!(self, TransactionStatus::Open)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown transaction status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(TransactionStatus::Success),
            "Cancelled" => Ok(TransactionStatus::Cancelled),
            "Expired" => Ok(TransactionStatus::Expired),
            "Failure" => Ok(TransactionStatus::Failure),
            "Open" => Ok(TransactionStatus::Open),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Answer to a successful `AcquirerStatusReq`.
///
/// Amount, currency and consumer details are only sent for `Success`, and the
/// consumer details may be withheld even then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOutcome {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub status_timestamp: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub consumer_name: Option<String>,
    pub consumer_iban: Option<String>,
    pub consumer_bic: Option<String>,
}

/// A business-level failure reported by the acquirer
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ProtocolError {
    pub code: String,
    pub message: String,
    pub detail: String,
    pub suggested_action: String,
    /// Text that may be shown to the consumer as-is
    pub consumer_message: String,
}

/// Outcome of an operation that reached the acquirer and could be trusted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquirerResponse<T> {
    Success(T),
    Error(ProtocolError),
}

impl<T> AcquirerResponse<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, AcquirerResponse::Error(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            AcquirerResponse::Success(value) => Some(value),
            AcquirerResponse::Error(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, ProtocolError> {
        match self {
            AcquirerResponse::Success(value) => Ok(value),
            AcquirerResponse::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TransactionStatus::Success,
            TransactionStatus::Cancelled,
            TransactionStatus::Expired,
            TransactionStatus::Failure,
            TransactionStatus::Open,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_is_case_sensitive() {
        assert_eq!(
            "success".parse::<TransactionStatus>(),
            Err(UnknownStatus("success".to_string()))
        );
    }

    #[test]
    fn test_open_is_not_final() {
        assert!(!TransactionStatus::Open.is_final());
        assert!(TransactionStatus::Cancelled.is_final());
    }

    #[test]
    fn test_entrance_code_shape() {
        let code = TransactionParameters::new_entrance_code();
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(code, TransactionParameters::new_entrance_code());
    }

    #[test]
    fn test_acquirer_response_accessors() {
        let ok: AcquirerResponse<u8> = AcquirerResponse::Success(1);
        assert!(!ok.is_error());
        assert_eq!(ok.success(), Some(&1));

        let error: AcquirerResponse<u8> = AcquirerResponse::Error(ProtocolError {
            code: "SO1000".into(),
            message: "Failure in system".into(),
            ..Default::default()
        });
        assert!(error.is_error());
        assert_eq!(error.into_result().unwrap_err().to_string(), "SO1000: Failure in system");
    }
}
