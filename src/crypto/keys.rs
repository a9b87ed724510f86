//! OpenSSL-backed key handles for the merchant signing key and the acquirer certificate.

use openssl::asn1::Asn1Time;
use openssl::x509::{X509, X509Ref};
use std::fmt;
use tracing::{debug, info};

use super::rsa::{self, RsaPrivateKey, RsaPublicKey};
use super::{CryptoResult, Error, HashAlg};
use crate::domain::ports::{SigningKey, VerificationKey};

/// Certificate thumbprint: upper-case hex SHA-1 of the DER encoded certificate.
///
/// This is the value acquirers expect in `KeyInfo/KeyName`.
pub fn thumbprint(certificate: &X509Ref) -> CryptoResult<String> {
    let digest = HashAlg::Sha1.hash(certificate.to_der()?)?;
    Ok(hex::encode_upper(digest))
}

fn check_validity(certificate: &X509Ref) -> CryptoResult<()> {
    let now = Asn1Time::days_from_now(0)?;

    if certificate.not_before() > now {
        return Err(Error::CertificateValidity("not yet valid".into()));
    }
    if certificate.not_after() < now {
        return Err(Error::CertificateValidity("expired".into()));
    }
    Ok(())
}

/// The merchant's private key together with the certificate registered at the acquirer
#[derive(Clone)]
pub struct MerchantKey {
    key: RsaPrivateKey,
    thumbprint: String,
}

impl MerchantKey {
    /// Pair a private key with its certificate.
    ///
    /// Fails when the certificate does not belong to the key.
    pub fn new(key: RsaPrivateKey, certificate: &X509Ref) -> CryptoResult<Self> {
        let certificate_key = certificate.public_key()?;
        if !certificate_key.public_eq(key.pkey()) {
            return Err(Error::Invalid(
                "Certificate does not match the merchant private key".into(),
            ));
        }

        let thumbprint = thumbprint(certificate)?;
        info!("Loaded merchant signing key {thumbprint}");
        Ok(Self { key, thumbprint })
    }

    /// Load from a PEM private key (PKCS#1 or PKCS#8) and a PEM certificate
    pub fn from_pem(
        private_key_pem: impl AsRef<[u8]>,
        certificate_pem: impl AsRef<[u8]>,
    ) -> CryptoResult<Self> {
        let key = RsaPrivateKey::from_pem(private_key_pem)?;
        let certificate = X509::from_pem(certificate_pem.as_ref())?;
        Self::new(key, &certificate)
    }

    /// Load from a DER private key and a DER certificate
    pub fn from_der(
        private_key_der: impl AsRef<[u8]>,
        certificate_der: impl AsRef<[u8]>,
    ) -> CryptoResult<Self> {
        let key = RsaPrivateKey::from_der(private_key_der)?;
        let certificate = X509::from_der(certificate_der.as_ref())?;
        Self::new(key, &certificate)
    }

    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }
}

impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantKey")
            .field("thumbprint", &self.thumbprint)
            .finish_non_exhaustive()
    }
}

impl SigningKey for MerchantKey {
    fn key_name(&self) -> &str {
        &self.thumbprint
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let signature = rsa::sign(&self.key, data, HashAlg::Sha256)?;
        debug!("Produced {} byte signature", signature.as_bytes().len());
        Ok(signature.into_bytes())
    }
}

/// The acquirer's certificate used to check response signatures
#[derive(Debug, Clone)]
pub struct AcquirerCertificate {
    key: RsaPublicKey,
    thumbprint: String,
}

impl AcquirerCertificate {
    /// Wrap a certificate, rejecting one outside its validity period
    pub fn new(certificate: &X509Ref) -> CryptoResult<Self> {
        check_validity(certificate)?;

        let key = RsaPublicKey::from_certificate(certificate)?;
        let thumbprint = thumbprint(certificate)?;
        info!("Loaded acquirer certificate {thumbprint}");
        Ok(Self { key, thumbprint })
    }

    pub fn from_pem(certificate_pem: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let certificate = X509::from_pem(certificate_pem.as_ref())?;
        Self::new(&certificate)
    }

    pub fn from_der(certificate_der: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let certificate = X509::from_der(certificate_der.as_ref())?;
        Self::new(&certificate)
    }

    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }
}

impl VerificationKey for AcquirerCertificate {
    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        rsa::verify(&self.key, data, signature, HashAlg::Sha256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cert_utils::generate_self_signed;

    #[test]
    fn test_merchant_key_signs_for_matching_certificate() {
        let merchant = generate_self_signed("Test Merchant", 365).unwrap();
        let key = MerchantKey::from_pem(&merchant.private_key_pem, &merchant.certificate_pem)
            .unwrap();
        let certificate =
            AcquirerCertificate::from_pem(&merchant.certificate_pem).unwrap();

        let signature = key.sign(b"payload").unwrap();
        assert!(certificate.verify(b"payload", &signature).unwrap());
        assert!(!certificate.verify(b"other payload", &signature).unwrap());
        assert_eq!(key.key_name(), certificate.thumbprint());
    }

    #[test]
    fn test_thumbprint_format() {
        let merchant = generate_self_signed("Test Merchant", 365).unwrap();
        let certificate = X509::from_pem(&merchant.certificate_pem).unwrap();
        let thumbprint = thumbprint(&certificate).unwrap();

        assert_eq!(thumbprint.len(), 40);
        assert!(
            thumbprint
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn test_mismatched_certificate_is_rejected() {
        let first = generate_self_signed("First", 365).unwrap();
        let second = generate_self_signed("Second", 365).unwrap();

        let result = MerchantKey::from_pem(&first.private_key_pem, &second.certificate_pem);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }

    #[test]
    fn test_expired_acquirer_certificate_is_rejected() {
        let expired = generate_self_signed("Expired Acquirer", -1).unwrap();

        let result = AcquirerCertificate::from_pem(&expired.certificate_pem);
        assert!(matches!(result, Err(Error::CertificateValidity(_))));
    }

    #[test]
    fn test_der_loading() {
        let merchant = generate_self_signed("Test Merchant", 365).unwrap();
        let private_key = RsaPrivateKey::from_pem(&merchant.private_key_pem).unwrap();
        let certificate = X509::from_pem(&merchant.certificate_pem).unwrap();

        let key = MerchantKey::from_der(
            private_key.pkey().private_key_to_der().unwrap(),
            certificate.to_der().unwrap(),
        )
        .unwrap();
        let acquirer = AcquirerCertificate::from_der(certificate.to_der().unwrap()).unwrap();
        assert_eq!(key.thumbprint(), acquirer.thumbprint());
    }

    #[test]
    fn test_debug_does_not_leak_key_material() {
        let merchant = generate_self_signed("Test Merchant", 365).unwrap();
        let key = MerchantKey::from_pem(&merchant.private_key_pem, &merchant.certificate_pem)
            .unwrap();
        let debug_str = format!("{key:?}");
        assert!(debug_str.contains("thumbprint"));
        assert!(!debug_str.contains("PRIVATE"));
    }
}
