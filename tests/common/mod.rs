#![allow(dead_code)]

use std::sync::Arc;

use ideal_connector::adapters::messages::CanonicalDocument;
use ideal_connector::adapters::xml_signature::XmlSignatureSigner;
use ideal_connector::crypto::cert_utils::generate_self_signed;
use ideal_connector::{
    AcquirerCertificate, MerchantConfig, MerchantKey, RequestIdentity, telemetry,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MERCHANT_ID: &str = "002013788";
pub const IDEAL_PATH: &str = "/ideal/iDEALv3";
pub const NAMESPACE: &str = "http://www.idealdesk.com/ideal/messages/mer-acq/3.3.1";

/// Key material of both sides of the exchange
pub struct Parties {
    pub merchant_key: MerchantKey,
    pub merchant_certificate: AcquirerCertificate,
    pub acquirer_key: MerchantKey,
    pub acquirer_certificate: AcquirerCertificate,
}

impl Parties {
    pub fn generate() -> Self {
        telemetry::init_tracing();

        let merchant = generate_self_signed("Test Merchant", 365).unwrap();
        let acquirer = generate_self_signed("Test Acquirer", 365).unwrap();

        Self {
            merchant_key: MerchantKey::from_pem(
                &merchant.private_key_pem,
                &merchant.certificate_pem,
            )
            .unwrap(),
            merchant_certificate: AcquirerCertificate::from_pem(&merchant.certificate_pem)
                .unwrap(),
            acquirer_key: MerchantKey::from_pem(
                &acquirer.private_key_pem,
                &acquirer.certificate_pem,
            )
            .unwrap(),
            acquirer_certificate: AcquirerCertificate::from_pem(&acquirer.certificate_pem)
                .unwrap(),
        }
    }

    /// The merchant's view: its own key and the acquirer's certificate
    pub fn identity(&self, server: &MockServer) -> RequestIdentity {
        RequestIdentity::new(
            MerchantConfig::new(MERCHANT_ID).with_endpoint(endpoint(server)),
            Arc::new(self.merchant_key.clone()),
            Arc::new(self.acquirer_certificate.clone()),
        )
    }

    /// Wrap `body` in `root` and sign it the way the acquirer does
    pub fn signed_response(&self, root: &'static str, body: &str) -> String {
        let document = CanonicalDocument::new(
            root,
            format!(r#"<{root} xmlns="{NAMESPACE}" version="3.3.1">{body}</{root}>"#),
        );
        XmlSignatureSigner::new(&self.acquirer_key)
            .sign_document(&document)
            .unwrap()
    }
}

pub fn error_response(code: &str, message: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<AcquirerErrorRes xmlns="{ns}" version="3.3.1">"#,
            "<createDateTimestamp>2024-03-01T09:05:08.000Z</createDateTimestamp>",
            "<Error><errorCode>{code}</errorCode><errorMessage>{message}</errorMessage>",
            "<errorDetail>Field generating error: merchantID</errorDetail>",
            "<suggestedAction>Please contact your acquirer</suggestedAction>",
            "<consumerMessage>Betalen met iDEAL is nu niet mogelijk.</consumerMessage>",
            "</Error></AcquirerErrorRes>"
        ),
        ns = NAMESPACE,
        code = code,
        message = message
    )
}

/// A fake acquirer answering every XML POST with `status` and `response`
pub async fn acquirer_answering(status: u16, response: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(IDEAL_PATH))
        .and(header("content-type", "text/xml; charset=utf-8"))
        .respond_with(ResponseTemplate::new(status).set_body_string(response))
        .mount(&server)
        .await;
    server
}

pub fn endpoint(server: &MockServer) -> String {
    format!("{}{}", server.uri(), IDEAL_PATH)
}

/// The single request body the fake acquirer received
pub async fn received_body(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    String::from_utf8(requests[0].body.clone()).unwrap()
}
