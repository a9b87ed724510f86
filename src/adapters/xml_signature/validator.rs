//! XML signature validator for incoming acquirer responses.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use super::constants::*;
use super::signer::digest_value;
use super::writer::expand_empty_elements;
use crate::adapters::messages::extractor::extract_value;
use crate::domain::errors::TrustError;
use crate::domain::ports::VerificationKey;

/// Checks the acquirer's signature on a response
pub struct XmlSignatureValidator<'a> {
    key: &'a dyn VerificationKey,
}

impl<'a> XmlSignatureValidator<'a> {
    pub fn new(key: &'a dyn VerificationKey) -> Self {
        Self { key }
    }

    /// Verify the signed `DigestValue` against the response body and
    /// `SignatureValue` over the response's `SignedInfo`
    pub fn validate(&self, response: &str) -> Result<(), TrustError> {
        debug!("Validating acquirer response signature");

        let signed_info = reconstruct_signed_info(response)?;
        let signature = signature_value(response)?;
        verify_digest(response)?;

        match self.key.verify(signed_info.as_bytes(), &signature) {
            Ok(true) => {
                info!("Acquirer response signature verified");
                Ok(())
            }
            Ok(false) => {
                warn!("Acquirer response signature verification failed");
                Err(TrustError::InvalidSignature)
            }
            Err(e) => {
                warn!("Error during signature verification: {e}");
                Err(TrustError::Key(e))
            }
        }
    }
}

/// Rebuild the bytes the acquirer signed: the literal `SignedInfo` content,
/// wrapped with the XML-DSig namespace it inherits in the response, with every
/// empty-element tag expanded.
pub fn reconstruct_signed_info(response: &str) -> Result<String, TrustError> {
    let Some(inner) = extract_value(SIGNED_INFO_ELEMENT, response, 0) else {
        if response.contains("<SignedInfo ") {
            // Attributes on SignedInfo are not supported
            warn!("SignedInfo element carries attributes, cannot reconstruct signed bytes");
        } else {
            warn!("No SignedInfo element in acquirer response");
        }
        return Err(TrustError::MissingSignature);
    };

    let wrapped = format!(
        r#"<{SIGNED_INFO_ELEMENT} {XMLNS_ATTRIBUTE}="{XMLDSIG_NAMESPACE}">{inner}</{SIGNED_INFO_ELEMENT}>"#
    );
    expand_empty_elements(&wrapped).map_err(|e| TrustError::MalformedSignature(e.to_string()))
}

/// Decoded `SignatureValue`, ignoring the line breaks acquirers wrap base64 with
pub fn signature_value(response: &str) -> Result<Vec<u8>, TrustError> {
    let encoded = extract_value(SIGNATURE_VALUE_ELEMENT, response, 0).ok_or_else(|| {
        warn!("No SignatureValue element in acquirer response");
        TrustError::MissingSignature
    })?;

    let compact = strip_whitespace(encoded);
    if compact.is_empty() {
        return Err(TrustError::MissingSignature);
    }

    STANDARD
        .decode(compact)
        .map_err(|e| TrustError::MalformedSignature(format!("SignatureValue is not base64: {e}")))
}

/// The digested document: the response without XML declaration and without
/// the enveloped `Signature`, with every empty-element tag expanded.
pub fn signed_body(response: &str) -> Result<String, TrustError> {
    let document = strip_declaration(response);

    let start = find_signature_start(document).ok_or(TrustError::MissingSignature)?;
    let closing = format!("</{SIGNATURE_ELEMENT}>");
    let end = document[start..]
        .find(&closing)
        .map(|offset| start + offset + closing.len())
        .ok_or_else(|| TrustError::MalformedSignature("Signature element is not closed".into()))?;

    let enveloped = format!("{}{}", &document[..start], &document[end..]);
    expand_empty_elements(&enveloped).map_err(|e| TrustError::MalformedSignature(e.to_string()))
}

/// Compare the signed `DigestValue` with the digest of the response body
fn verify_digest(response: &str) -> Result<(), TrustError> {
    let expected = extract_value(DIGEST_VALUE_ELEMENT, response, 0)
        .map(strip_whitespace)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            warn!("No DigestValue element in acquirer response");
            TrustError::MissingSignature
        })?;

    let actual = digest_value(&signed_body(response)?)?;
    if actual != expected {
        warn!("Digest value verification failed");
        return Err(TrustError::InvalidSignature);
    }
    Ok(())
}

fn strip_declaration(response: &str) -> &str {
    let trimmed = response.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return trimmed[end + 2..].trim_start();
        }
    }
    trimmed
}

/// Offset of `<Signature` followed by whitespace or `>`, skipping
/// `<SignatureValue>` and friends
fn find_signature_start(document: &str) -> Option<usize> {
    let open = format!("<{SIGNATURE_ELEMENT}");
    document.match_indices(&open).map(|(offset, _)| offset).find(|offset| {
        matches!(
            document.as_bytes().get(offset + open.len()),
            Some(b' ' | b'>' | b'\t' | b'\r' | b'\n')
        )
    })
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}
