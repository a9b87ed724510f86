//! Enveloped XML signature for outgoing acquirer requests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use super::constants::*;
use super::writer::{CanonicalWriter, WriteResult};
use crate::adapters::messages::CanonicalDocument;
use crate::crypto::{self, HashAlg};
use crate::domain::errors::IdealError;
use crate::domain::ports::SigningKey;

/// `base64(SHA-256(canonical))`
pub fn digest_value(canonical: &str) -> Result<String, crypto::Error> {
    let digest = HashAlg::Sha256.hash(canonical.as_bytes())?;
    Ok(STANDARD.encode(digest))
}

/// Write the `SignedInfo` element.
///
/// With `xmlns` set the element is standalone: these are the bytes that get
/// signed. Embedded in `Signature` the namespace is inherited and omitted.
pub fn write_signed_info(
    writer: &mut CanonicalWriter,
    digest_value: &str,
    xmlns: Option<&str>,
) -> WriteResult<()> {
    match xmlns {
        Some(namespace) => writer.open(SIGNED_INFO_ELEMENT, &[(XMLNS_ATTRIBUTE, namespace)])?,
        None => writer.open(SIGNED_INFO_ELEMENT, &[])?,
    };
    writer
        .element(
            CANONICALIZATION_METHOD_ELEMENT,
            &[(ALGORITHM_ATTRIBUTE, EXCLUSIVE_C14N_ALGORITHM)],
            "",
        )?
        .element(
            SIGNATURE_METHOD_ELEMENT,
            &[(ALGORITHM_ATTRIBUTE, RSA_SHA256_ALGORITHM)],
            "",
        )?
        .open(REFERENCE_ELEMENT, &[(URI_ATTRIBUTE, "")])?
        .open(TRANSFORMS_ELEMENT, &[])?
        .element(
            TRANSFORM_ELEMENT,
            &[(ALGORITHM_ATTRIBUTE, XMLDSIG_ENVELOPED_SIGNATURE)],
            "",
        )?
        .close(TRANSFORMS_ELEMENT)?
        .element(
            DIGEST_METHOD_ELEMENT,
            &[(ALGORITHM_ATTRIBUTE, SHA256_DIGEST_ALGORITHM)],
            "",
        )?
        .leaf(DIGEST_VALUE_ELEMENT, digest_value)?
        .close(REFERENCE_ELEMENT)?
        .close(SIGNED_INFO_ELEMENT)?;
    Ok(())
}

/// XML signature signer for outgoing requests
pub struct XmlSignatureSigner<'a> {
    key: &'a dyn SigningKey,
}

impl<'a> XmlSignatureSigner<'a> {
    pub fn new(key: &'a dyn SigningKey) -> Self {
        Self { key }
    }

    /// Sign `document` and return the final outbound XML
    pub fn sign_document(&self, document: &CanonicalDocument) -> Result<String, IdealError> {
        debug!("Signing {} with key {}", document.root(), self.key.key_name());

        // Step 1: digest of the canonical document
        let digest = digest_value(document.as_str()).map_err(IdealError::Signing)?;

        // Step 2: sign the standalone SignedInfo
        let mut writer = CanonicalWriter::new();
        write_signed_info(&mut writer, &digest, Some(XMLDSIG_NAMESPACE))?;
        let signed_info = writer.into_string()?;

        let signature_bytes = self
            .key
            .sign(signed_info.as_bytes())
            .map_err(IdealError::Signing)?;
        let signature_b64 = STANDARD.encode(signature_bytes);

        // Step 3: the Signature block, placed before the closing root tag
        let signature = self.signature_block(&digest, &signature_b64)?;

        info!("{} signed", document.root());
        Ok(document.envelope(&signature)?)
    }

    fn signature_block(&self, digest: &str, signature_b64: &str) -> WriteResult<String> {
        let mut writer = CanonicalWriter::new();
        writer.open(SIGNATURE_ELEMENT, &[(XMLNS_ATTRIBUTE, XMLDSIG_NAMESPACE)])?;
        write_signed_info(&mut writer, digest, None)?;
        writer
            .leaf(SIGNATURE_VALUE_ELEMENT, signature_b64)?
            .open(KEY_INFO_ELEMENT, &[])?
            .leaf(KEY_NAME_ELEMENT, self.key.key_name())?
            .close(KEY_INFO_ELEMENT)?
            .close(SIGNATURE_ELEMENT)?;
        writer.into_string()
    }
}
