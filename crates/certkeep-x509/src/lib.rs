//! X.509 certificate decoding for certkeep.
//!
//! Turns an uploaded certificate file (DER or PEM) into the subject and
//! validity fields the store keeps, plus a SHA-1 fingerprint over the
//! to-be-signed bytes. The fingerprint identifies certificate content
//! regardless of encoding or filename: the same certificate uploaded as
//! `.cer` and as `.pem` fingerprints identically.

use sha1::{Digest, Sha1};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

/// Subject attributes with no shorthand iterator in `x509-parser`, matched
/// by dotted OID: serialNumber carries the tax id, organizationIdentifier
/// carries the national registry id.
const OID_SERIAL_NUMBER: &str = "2.5.4.5";
const OID_ORG_IDENTIFIER: &str = "2.5.4.97";

/// Prefixes the issuing platform puts in front of the raw identifiers.
const TAX_ID_PREFIX: &str = "TINUA-";
const REGISTRY_ID_PREFIX: &str = "NTRUA-";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Input decodes as neither DER nor PEM.
    #[error("not a DER- or PEM-encoded X.509 certificate")]
    MalformedCertificate,
}

/// Fields extracted from one certificate.
///
/// Missing subject attributes come back as empty strings; only a body that
/// fails to decode at all is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCertificate {
    pub organization: String,
    /// Subject common name; the person the certificate was issued to.
    pub director: String,
    pub tax_id: String,
    pub registry_id: String,
    /// Unix seconds.
    pub valid_from: i64,
    /// Unix seconds.
    pub valid_to: i64,
    /// Lowercase hex SHA-1 over the to-be-signed bytes.
    pub fingerprint: String,
}

/// Decode a certificate, trying DER first and falling back to PEM.
pub fn parse_certificate(data: &[u8]) -> Result<ParsedCertificate, ParseError> {
    if let Ok((_, cert)) = X509Certificate::from_der(data) {
        return Ok(extract(&cert));
    }

    let (_, pem) = parse_x509_pem(data).map_err(|_| ParseError::MalformedCertificate)?;
    let cert = pem.parse_x509().map_err(|_| ParseError::MalformedCertificate)?;
    Ok(extract(&cert))
}

fn extract(cert: &X509Certificate<'_>) -> ParsedCertificate {
    let subject = cert.subject();

    let organization = first_value(subject.iter_organization());
    let director = first_value(subject.iter_common_name());
    let tax_id = strip_tag(&attr_by_oid(subject, OID_SERIAL_NUMBER), TAX_ID_PREFIX);
    let registry_id = strip_tag(&attr_by_oid(subject, OID_ORG_IDENTIFIER), REGISTRY_ID_PREFIX);

    let validity = cert.validity();
    let valid_from = validity.not_before.to_datetime().unix_timestamp();
    let valid_to = validity.not_after.to_datetime().unix_timestamp();

    let fingerprint = hex::encode(Sha1::digest(cert.tbs_certificate.as_ref()));

    ParsedCertificate {
        organization,
        director,
        tax_id,
        registry_id,
        valid_from,
        valid_to,
        fingerprint,
    }
}

fn first_value<'a, 'b: 'a>(mut attrs: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>) -> String {
    attrs
        .next()
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn attr_by_oid(subject: &X509Name<'_>, dotted: &str) -> String {
    subject
        .iter_attributes()
        .find(|attr| attr.attr_type().to_id_string() == dotted)
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn strip_tag(value: &str, prefix: &str) -> String {
    value.strip_prefix(prefix).unwrap_or(value).to_string()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, date_time_ymd};

    fn full_subject_cert() -> rcgen::Certificate {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, "TOV Chervona Kalyna");
        dn.push(DnType::CommonName, "Oksana Shevchenko");
        dn.push(DnType::CustomDnType(vec![2, 5, 4, 5]), "TINUA-1234567890");
        dn.push(DnType::CustomDnType(vec![2, 5, 4, 97]), "NTRUA-87654321");
        params.distinguished_name = dn;
        params.not_before = date_time_ymd(2024, 3, 1);
        params.not_after = date_time_ymd(2026, 3, 1);

        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap()
    }

    fn bare_cert() -> rcgen::Certificate {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "Nameless");
        params.distinguished_name = dn;
        params.not_before = date_time_ymd(2024, 1, 1);
        params.not_after = date_time_ymd(2025, 1, 1);

        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap()
    }

    #[test]
    fn der_subject_fields_extracted_with_prefixes_stripped() {
        let cert = full_subject_cert();
        let parsed = parse_certificate(cert.der().as_ref()).unwrap();

        assert_eq!(parsed.organization, "TOV Chervona Kalyna");
        assert_eq!(parsed.director, "Oksana Shevchenko");
        assert_eq!(parsed.tax_id, "1234567890");
        assert_eq!(parsed.registry_id, "87654321");
    }

    #[test]
    fn validity_is_unix_seconds() {
        let cert = full_subject_cert();
        let parsed = parse_certificate(cert.der().as_ref()).unwrap();

        // 2024-03-01T00:00:00Z and 2026-03-01T00:00:00Z
        assert_eq!(parsed.valid_from, 1_709_251_200);
        assert_eq!(parsed.valid_to, 1_772_323_200);
    }

    #[test]
    fn fingerprint_is_lowercase_hex_sha1() {
        let cert = full_subject_cert();
        let parsed = parse_certificate(cert.der().as_ref()).unwrap();

        assert_eq!(parsed.fingerprint.len(), 40);
        assert!(
            parsed
                .fingerprint
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn pem_and_der_produce_identical_records() {
        let cert = full_subject_cert();

        let from_der = parse_certificate(cert.der().as_ref()).unwrap();
        let from_pem = parse_certificate(cert.pem().as_bytes()).unwrap();

        assert_eq!(from_der, from_pem);
    }

    #[test]
    fn first_value_picks_the_leading_attribute_or_empty() {
        let cert = full_subject_cert();
        let (_, x509) = X509Certificate::from_der(cert.der().as_ref()).unwrap();
        let subject = x509.subject();

        assert_eq!(first_value(subject.iter_organization()), "TOV Chervona Kalyna");

        let bare = bare_cert();
        let (_, x509) = X509Certificate::from_der(bare.der().as_ref()).unwrap();
        assert_eq!(first_value(x509.subject().iter_organization()), "");
    }

    #[test]
    fn missing_subject_attributes_become_empty_strings() {
        let cert = bare_cert();
        let parsed = parse_certificate(cert.der().as_ref()).unwrap();

        assert_eq!(parsed.director, "Nameless");
        assert_eq!(parsed.organization, "");
        assert_eq!(parsed.tax_id, "");
        assert_eq!(parsed.registry_id, "");
        assert!(!parsed.fingerprint.is_empty());
    }

    #[test]
    fn unprefixed_identifiers_are_kept_as_is() {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, "FOP Petrenko");
        dn.push(DnType::CustomDnType(vec![2, 5, 4, 5]), "555");
        params.distinguished_name = dn;
        params.not_before = date_time_ymd(2024, 1, 1);
        params.not_after = date_time_ymd(2025, 1, 1);
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();

        let parsed = parse_certificate(cert.der().as_ref()).unwrap();
        assert_eq!(parsed.tax_id, "555");
    }

    #[test]
    fn garbage_input_is_malformed() {
        let err = parse_certificate(b"not a certificate").unwrap_err();
        assert!(matches!(err, ParseError::MalformedCertificate));

        let err = parse_certificate(&[]).unwrap_err();
        assert!(matches!(err, ParseError::MalformedCertificate));
    }

    #[test]
    fn truncated_pem_is_malformed() {
        let cert = full_subject_cert();
        let pem = cert.pem();
        let truncated = &pem.as_bytes()[..pem.len() / 2];

        assert!(parse_certificate(truncated).is_err());
    }
}
