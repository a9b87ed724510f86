use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::errors::IdealError;
use super::mapper;
use super::models::{
    AcquirerResponse, Issuer, RequestIdentity, StatusOutcome, TransactionOutcome,
    TransactionParameters,
};
use super::ports::{Transport, TransportError};
use crate::adapters::http::HttpTransport;
use crate::adapters::messages::{CanonicalDocument, MessageBuilder};
use crate::adapters::xml_signature::XmlSignatureSigner;
use crate::config::HttpConfig;

/// Runs the three acquirer operations.
///
/// Holds nothing but the transport; everything about the caller travels in the
/// [`RequestIdentity`] of each call, so one connector can serve concurrent calls
/// for different merchants.
#[derive(Debug, Clone)]
pub struct Connector<T: Transport = HttpTransport> {
    transport: T,
}

impl Connector<HttpTransport> {
    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> Connector<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Fetch the current list of issuers
    #[instrument(skip_all, fields(merchant_id = %identity.merchant.merchant_id))]
    pub async fn directory(
        &self,
        identity: &RequestIdentity,
    ) -> Result<AcquirerResponse<Vec<Issuer>>, IdealError> {
        let document = MessageBuilder::new(&identity.merchant, &Utc::now()).directory()?;
        let response = self.exchange(identity, &document).await?;
        mapper::decode(
            &response,
            identity.merchant.validate_signature,
            identity.acquirer_key.as_ref(),
            mapper::directory,
        )
    }

    /// Start a payment at `issuer_id` and obtain the consumer redirect URL
    #[instrument(skip_all, fields(merchant_id = %identity.merchant.merchant_id, issuer_id = %issuer_id, purchase_id = %parameters.purchase_id))]
    pub async fn transaction(
        &self,
        identity: &RequestIdentity,
        issuer_id: &str,
        parameters: &TransactionParameters,
    ) -> Result<AcquirerResponse<TransactionOutcome>, IdealError> {
        let document = MessageBuilder::new(&identity.merchant, &Utc::now())
            .transaction(issuer_id, parameters)?;
        let response = self.exchange(identity, &document).await?;
        let outcome = mapper::decode(
            &response,
            identity.merchant.validate_signature,
            identity.acquirer_key.as_ref(),
            mapper::transaction,
        )?;

        if let AcquirerResponse::Success(trx) = &outcome {
            info!("Transaction {} created", trx.transaction_id);
        }
        Ok(outcome)
    }

    /// Ask for the outcome of a previously started payment
    #[instrument(skip_all, fields(merchant_id = %identity.merchant.merchant_id, transaction_id = %transaction_id))]
    pub async fn status(
        &self,
        identity: &RequestIdentity,
        transaction_id: &str,
    ) -> Result<AcquirerResponse<StatusOutcome>, IdealError> {
        let document =
            MessageBuilder::new(&identity.merchant, &Utc::now()).status(transaction_id)?;
        let response = self.exchange(identity, &document).await?;
        let outcome = mapper::decode(
            &response,
            identity.merchant.validate_signature,
            identity.acquirer_key.as_ref(),
            mapper::status,
        )?;

        if let AcquirerResponse::Success(status) = &outcome {
            info!("Transaction {} is {}", status.transaction_id, status.status);
        }
        Ok(outcome)
    }

    /// Sign `document`, post it and return the response text
    async fn exchange(
        &self,
        identity: &RequestIdentity,
        document: &CanonicalDocument,
    ) -> Result<String, IdealError> {
        let signed = XmlSignatureSigner::new(identity.signing_key.as_ref()).sign_document(document)?;

        info!("Sending {} to {}", document.root(), identity.merchant.endpoint);
        let body = self
            .transport
            .post(&identity.merchant.endpoint, signed.into_bytes())
            .await?;
        debug!("Acquirer answered with {} bytes", body.len());

        Ok(String::from_utf8(body).unwrap_or_else(|e| {
            warn!("Response is not UTF-8: {e}");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }))
    }
}
