//! Response handling shared by the three operations.
//!
//! An `errorCode` answer is returned as a [`ProtocolError`] without looking at
//! the signature. Anything else is verified first (when enabled) and only then
//! are the operation's fields read.

use std::borrow::Cow;
use std::str::FromStr;

use quick_xml::escape::unescape;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::errors::IdealError;
use super::models::{
    AcquirerResponse, Issuer, ProtocolError, StatusOutcome, TransactionOutcome, TransactionStatus,
};
use super::ports::VerificationKey;
use crate::adapters::messages::extractor::{extract_value, group_scope, repeated_groups};
use crate::adapters::xml_signature::XmlSignatureValidator;

const ISSUER_GROUP: &str = "<Issuer>";

/// Decode `response` into either a protocol error or the value `extract` reads
pub fn decode<T, F>(
    response: &str,
    validate_signature: bool,
    acquirer_key: &dyn VerificationKey,
    extract: F,
) -> Result<AcquirerResponse<T>, IdealError>
where
    F: FnOnce(&str) -> Result<T, IdealError>,
{
    if let Some(error) = protocol_error(response) {
        warn!(
            "Acquirer returned error {}: {}",
            error.code, error.message
        );
        return Ok(AcquirerResponse::Error(error));
    }

    if validate_signature {
        XmlSignatureValidator::new(acquirer_key).validate(response)?;
    } else {
        warn!("Signature validation disabled, acquirer response is not verified");
    }

    extract(response).map(AcquirerResponse::Success)
}

/// The `ErrorRes` fields, when `errorCode` is present and non-empty
pub fn protocol_error(response: &str) -> Option<ProtocolError> {
    let code = field("errorCode", response);
    if code.is_empty() {
        return None;
    }

    Some(ProtocolError {
        code,
        message: field("errorMessage", response),
        detail: field("errorDetail", response),
        suggested_action: field("suggestedAction", response),
        consumer_message: field("consumerMessage", response),
    })
}

/// Issuers in document order
pub fn directory(response: &str) -> Result<Vec<Issuer>, IdealError> {
    let issuers: Vec<Issuer> = repeated_groups(ISSUER_GROUP, response)
        .into_iter()
        .map(|offset| {
            let scope = group_scope(ISSUER_GROUP, response, offset);
            Issuer {
                id: field("issuerID", scope),
                name: field("issuerName", scope),
            }
        })
        .collect();

    debug!("Directory lists {} issuers", issuers.len());
    Ok(issuers)
}

pub fn transaction(response: &str) -> Result<TransactionOutcome, IdealError> {
    Ok(TransactionOutcome {
        issuer_authentication_url: field("issuerAuthenticationURL", response),
        transaction_id: field("transactionID", response),
        transaction_create_timestamp: field("transactionCreateDateTimestamp", response),
        purchase_id: field("purchaseID", response),
    })
}

pub fn status(response: &str) -> Result<StatusOutcome, IdealError> {
    let raw_status = optional_field("status", response).ok_or_else(|| {
        IdealError::MalformedResponse("Status response carries no status".to_string())
    })?;
    let status = TransactionStatus::from_str(&raw_status)
        .map_err(|e| IdealError::MalformedResponse(e.to_string()))?;

    let amount = optional_field("amount", response)
        .map(|raw| {
            Decimal::from_str(raw.trim()).map_err(|e| {
                IdealError::MalformedResponse(format!("Invalid amount '{raw}': {e}"))
            })
        })
        .transpose()?;

    Ok(StatusOutcome {
        transaction_id: field("transactionID", response),
        status,
        status_timestamp: optional_field("statusDateTimestamp", response),
        amount,
        currency: optional_field("currency", response),
        consumer_name: optional_field("consumerName", response),
        consumer_iban: optional_field("consumerIBAN", response),
        consumer_bic: optional_field("consumerBIC", response),
    })
}

/// Entity-decoded text of `tag`, empty when absent
fn field(tag: &str, text: &str) -> String {
    extract_value(tag, text, 0)
        .map(decode_text)
        .unwrap_or_default()
}

/// Entity-decoded text of `tag`, `None` when absent or empty
fn optional_field(tag: &str, text: &str) -> Option<String> {
    Some(field(tag, text)).filter(|value| !value.is_empty())
}

fn decode_text(raw: &str) -> String {
    match unescape(raw) {
        Ok(Cow::Borrowed(value)) => value.to_string(),
        Ok(Cow::Owned(value)) => value,
        Err(e) => {
            debug!("Keeping undecodable text as-is: {e}");
            raw.to_string()
        }
    }
}
