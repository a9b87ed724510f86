//! Throwaway self-signed RSA certificates for tests and local simulators.

use chrono::{Duration, Utc};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509Name, X509NameBuilder};

use super::CryptoResult;

#[derive(Debug, Clone)]
pub struct TestKeyMaterial {
    pub certificate_pem: Vec<u8>,
    pub private_key_pem: Vec<u8>,
}

/// Generate a 2048-bit RSA key and a self-signed certificate for it.
///
/// The certificate becomes valid a day ago and expires `validity_days` from now;
/// a negative value yields an already expired certificate.
pub fn generate_self_signed(common_name: &str, validity_days: i64) -> CryptoResult<TestKeyMaterial> {
    let rsa = Rsa::generate(2048)?;
    let key_pair = PKey::from_rsa(rsa)?;

    let mut cert_builder = X509Builder::new()?;
    cert_builder.set_version(2)?;
    let serial = generate_serial_number()?;
    cert_builder.set_serial_number(&serial)?;

    let subject_name = create_x509_name(&[
        ("C", "NL"),
        ("O", "iDEAL Test"),
        ("CN", common_name),
    ])?;
    cert_builder.set_subject_name(&subject_name)?;
    cert_builder.set_issuer_name(&subject_name)?;
    cert_builder.set_pubkey(&key_pair)?;

    let now = Utc::now();
    let not_before = Asn1Time::from_unix((now - Duration::days(1)).timestamp())?;
    let not_after = Asn1Time::from_unix((now + Duration::days(validity_days)).timestamp())?;
    cert_builder.set_not_before(&not_before)?;
    cert_builder.set_not_after(&not_after)?;

    cert_builder.append_extension(BasicConstraints::new().build()?)?;
    cert_builder.append_extension(KeyUsage::new().critical().digital_signature().build()?)?;
    cert_builder.sign(&key_pair, MessageDigest::sha256())?;

    Ok(TestKeyMaterial {
        certificate_pem: cert_builder.build().to_pem()?,
        private_key_pem: key_pair.private_key_to_pem_pkcs8()?,
    })
}

fn generate_serial_number() -> CryptoResult<Asn1Integer> {
    let mut serial = BigNum::new()?;
    serial.rand(128, MsbOption::MAYBE_ZERO, false)?;
    Ok(serial.to_asn1_integer()?)
}

fn create_x509_name(entries: &[(&str, &str)]) -> CryptoResult<X509Name> {
    let mut name_builder = X509NameBuilder::new()?;
    for (key, value) in entries {
        name_builder.append_entry_by_text(key, value)?;
    }
    Ok(name_builder.build())
}
