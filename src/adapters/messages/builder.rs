//! Canonical (unsigned) request documents.
//!
//! The digest is computed over exactly the bytes produced here and the acquirer
//! recomputes it independently, so element order is fixed and no element is ever
//! written in empty-element form.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::adapters::xml_signature::writer::{CanonicalWriter, WriteError, WriteResult};
use crate::config::MerchantConfig;
use crate::domain::models::TransactionParameters;

pub const IDEAL_NAMESPACE: &str = "http://www.idealdesk.com/ideal/messages/mer-acq/3.3.1";
pub const PROTOCOL_VERSION: &str = "3.3.1";
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub const DIRECTORY_REQUEST: &str = "DirectoryReq";
pub const TRANSACTION_REQUEST: &str = "AcquirerTrxReq";
pub const STATUS_REQUEST: &str = "AcquirerStatusReq";

pub const CURRENCY: &str = "EUR";
pub const EXPIRATION_PERIOD: &str = "PT1H";
pub const LANGUAGE: &str = "nl";

/// `yyyy-MM-ddTHH:mm:ssZ`, second precision
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Two decimals, `.` separator, no grouping; midpoints round away from zero
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// A request document in the exact form that is digested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDocument {
    root: &'static str,
    xml: String,
}

impl CanonicalDocument {
    pub fn new(root: &'static str, xml: String) -> Self {
        Self { root, xml }
    }

    pub fn root(&self) -> &'static str {
        self.root
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }

    /// Final outbound document: declaration, canonical content and `signature`
    /// in front of the closing root tag
    pub fn envelope(&self, signature: &str) -> WriteResult<String> {
        let closing = format!("</{}>", self.root);
        let body = self.xml.strip_suffix(&closing).ok_or_else(|| {
            WriteError(format!("Document does not end with {closing}"))
        })?;
        Ok(format!("{XML_DECLARATION}{body}{signature}{closing}"))
    }
}

/// Builds the canonical request documents for one merchant at one instant
pub struct MessageBuilder<'a> {
    merchant: &'a MerchantConfig,
    timestamp: String,
}

impl<'a> MessageBuilder<'a> {
    pub fn new(merchant: &'a MerchantConfig, timestamp: &DateTime<Utc>) -> Self {
        Self {
            merchant,
            timestamp: format_timestamp(timestamp),
        }
    }

    /// `DirectoryReq`: createDateTimestamp, Merchant{merchantID, subID}
    pub fn directory(&self) -> WriteResult<CanonicalDocument> {
        let mut writer = self.start(DIRECTORY_REQUEST)?;
        self.merchant(&mut writer, None)?;
        finish(writer, DIRECTORY_REQUEST)
    }

    /// `AcquirerTrxReq`: createDateTimestamp, Issuer, Merchant with return URL, Transaction
    pub fn transaction(
        &self,
        issuer_id: &str,
        parameters: &TransactionParameters,
    ) -> WriteResult<CanonicalDocument> {
        let mut writer = self.start(TRANSACTION_REQUEST)?;
        writer
            .open("Issuer", &[])?
            .leaf("issuerID", issuer_id)?
            .close("Issuer")?;
        self.merchant(&mut writer, Some(&parameters.return_url))?;
        writer
            .open("Transaction", &[])?
            .leaf("purchaseID", &parameters.purchase_id)?
            .leaf("amount", &format_amount(parameters.amount))?
            .leaf("currency", CURRENCY)?
            .leaf("expirationPeriod", EXPIRATION_PERIOD)?
            .leaf("language", LANGUAGE)?
            .leaf("description", &parameters.description)?
            .leaf("entranceCode", &parameters.entrance_code)?
            .close("Transaction")?;
        finish(writer, TRANSACTION_REQUEST)
    }

    /// `AcquirerStatusReq`: createDateTimestamp, Merchant, Transaction{transactionID}
    pub fn status(&self, transaction_id: &str) -> WriteResult<CanonicalDocument> {
        let mut writer = self.start(STATUS_REQUEST)?;
        self.merchant(&mut writer, None)?;
        writer
            .open("Transaction", &[])?
            .leaf("transactionID", transaction_id)?
            .close("Transaction")?;
        finish(writer, STATUS_REQUEST)
    }

    fn start(&self, root: &str) -> WriteResult<CanonicalWriter> {
        let mut writer = CanonicalWriter::new();
        writer
            .open(
                root,
                &[("xmlns", IDEAL_NAMESPACE), ("version", PROTOCOL_VERSION)],
            )?
            .leaf("createDateTimestamp", &self.timestamp)?;
        Ok(writer)
    }

    fn merchant(&self, writer: &mut CanonicalWriter, return_url: Option<&str>) -> WriteResult<()> {
        writer
            .open("Merchant", &[])?
            .leaf("merchantID", &self.merchant.merchant_id)?
            .leaf("subID", &self.merchant.sub_id)?;
        if let Some(url) = return_url {
            writer.leaf("merchantReturnURL", url)?;
        }
        writer.close("Merchant")?;
        Ok(())
    }
}

fn finish(mut writer: CanonicalWriter, root: &'static str) -> WriteResult<CanonicalDocument> {
    writer.close(root)?;
    Ok(CanonicalDocument::new(root, writer.into_string()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn merchant() -> MerchantConfig {
        MerchantConfig::new("002013788")
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap()
    }

    fn parameters() -> TransactionParameters {
        TransactionParameters {
            return_url: "http://localhost:7878/idealreturn".into(),
            amount: dec!(2.95),
            description: "Test Order".into(),
            entrance_code: "e5d3a1".into(),
            purchase_id: "12332365".into(),
        }
    }

    #[test]
    fn test_directory_request() {
        let merchant = merchant();
        let document = MessageBuilder::new(&merchant, &timestamp()).directory().unwrap();

        assert_eq!(document.root(), "DirectoryReq");
        assert_eq!(
            document.as_str(),
            concat!(
                r#"<DirectoryReq xmlns="http://www.idealdesk.com/ideal/messages/mer-acq/3.3.1" version="3.3.1">"#,
                "<createDateTimestamp>2024-03-01T09:05:07Z</createDateTimestamp>",
                "<Merchant><merchantID>002013788</merchantID><subID>0</subID></Merchant>",
                "</DirectoryReq>"
            )
        );
    }

    #[test]
    fn test_transaction_request() {
        let merchant = merchant();
        let document = MessageBuilder::new(&merchant, &timestamp())
            .transaction("INGBNL2A", &parameters())
            .unwrap();

        assert_eq!(
            document.as_str(),
            concat!(
                r#"<AcquirerTrxReq xmlns="http://www.idealdesk.com/ideal/messages/mer-acq/3.3.1" version="3.3.1">"#,
                "<createDateTimestamp>2024-03-01T09:05:07Z</createDateTimestamp>",
                "<Issuer><issuerID>INGBNL2A</issuerID></Issuer>",
                "<Merchant><merchantID>002013788</merchantID><subID>0</subID>",
                "<merchantReturnURL>http://localhost:7878/idealreturn</merchantReturnURL></Merchant>",
                "<Transaction><purchaseID>12332365</purchaseID><amount>2.95</amount>",
                "<currency>EUR</currency><expirationPeriod>PT1H</expirationPeriod><language>nl</language>",
                "<description>Test Order</description><entranceCode>e5d3a1</entranceCode></Transaction>",
                "</AcquirerTrxReq>"
            )
        );
    }

    #[test]
    fn test_status_request() {
        let merchant = merchant().with_sub_id("3");
        let document = MessageBuilder::new(&merchant, &timestamp())
            .status("0050000000000001")
            .unwrap();

        assert_eq!(
            document.as_str(),
            concat!(
                r#"<AcquirerStatusReq xmlns="http://www.idealdesk.com/ideal/messages/mer-acq/3.3.1" version="3.3.1">"#,
                "<createDateTimestamp>2024-03-01T09:05:07Z</createDateTimestamp>",
                "<Merchant><merchantID>002013788</merchantID><subID>3</subID></Merchant>",
                "<Transaction><transactionID>0050000000000001</transactionID></Transaction>",
                "</AcquirerStatusReq>"
            )
        );
    }

    #[test]
    fn test_documents_are_deterministic() {
        let merchant = merchant();
        let first = MessageBuilder::new(&merchant, &timestamp());
        let second = MessageBuilder::new(&merchant, &timestamp());

        assert_eq!(first.directory().unwrap(), second.directory().unwrap());
        assert_eq!(
            first.transaction("RABONL2U", &parameters()).unwrap(),
            second.transaction("RABONL2U", &parameters()).unwrap()
        );
        assert_eq!(first.status("1").unwrap(), second.status("1").unwrap());
    }

    #[test]
    fn test_empty_values_are_never_self_closed() {
        let merchant = MerchantConfig::new("").with_sub_id("");
        let mut parameters = parameters();
        parameters.description = String::new();
        parameters.entrance_code = String::new();

        let builder = MessageBuilder::new(&merchant, &timestamp());
        let transaction = builder.transaction("", &parameters).unwrap();
        assert!(!transaction.as_str().contains("/>"));
        assert!(transaction.as_str().contains("<merchantID></merchantID><subID></subID>"));
        assert!(transaction.as_str().contains("<description></description><entranceCode></entranceCode>"));
        assert!(!builder.status("").unwrap().as_str().contains("/>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let merchant = merchant();
        let mut parameters = parameters();
        parameters.return_url = "https://shop.example/return?a=1&b=2".into();

        let document = MessageBuilder::new(&merchant, &timestamp())
            .transaction("INGBNL2A", &parameters)
            .unwrap();
        assert!(document.as_str().contains(
            "<merchantReturnURL>https://shop.example/return?a=1&amp;b=2</merchantReturnURL>"
        ));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(2.95)), "2.95");
        assert_eq!(format_amount(dec!(10)), "10.00");
        assert_eq!(format_amount(dec!(0.5)), "0.50");
        assert_eq!(format_amount(dec!(1234567.8)), "1234567.80");
        assert_eq!(format_amount(dec!(1.005)), "1.01");
        assert_eq!(format_amount(dec!(1.004)), "1.00");
    }

    #[test]
    fn test_envelope() {
        let document = CanonicalDocument::new("DirectoryReq", "<DirectoryReq><a></a></DirectoryReq>".into());
        assert_eq!(
            document.envelope("<Signature></Signature>").unwrap(),
            r#"<?xml version="1.0" encoding="UTF-8"?><DirectoryReq><a></a><Signature></Signature></DirectoryReq>"#
        );
    }

    #[test]
    fn test_envelope_requires_closing_root() {
        let document = CanonicalDocument::new("DirectoryReq", "<DirectoryReq><a></a>".into());
        assert!(document.envelope("<Signature></Signature>").is_err());
    }
}
