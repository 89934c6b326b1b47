//! Parsing and validation of PEM certificate material.

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};
use ring::{
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
        ECDSA_P384_SHA384_ASN1_SIGNING,
    },
};
use rustls::pki_types::{
    pem::{Error as PemError, PemObject},
    CertificateDer, PrivateKeyDer,
};
use simple_asn1::{ASN1Block, BigInt};
use tracing::debug;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::errors::TlsError;

const OID_ED25519: &str = "1.3.101.112";
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";

/// Metadata extracted from a leaf certificate for logging and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// A certificate chain together with the private key matching its leaf.
#[derive(Debug)]
pub struct ClientIdentity {
    pub chain: Vec<CertificateDer<'static>>,
    pub private_key: PrivateKeyDer<'static>,
    pub info: CertificateInfo,
}

/// Parse a client certificate and key, checking that they belong together.
pub fn load_client_identity(cert_pem: &[u8], key_pem: &[u8]) -> Result<ClientIdentity, TlsError> {
    let chain = parse_certificate_chain(cert_pem)?;
    let private_key = parse_private_key(key_pem)?;

    let leaf = parse_leaf(&chain[0])?;
    verify_key_matches(&leaf, &private_key)?;

    Ok(ClientIdentity { chain, private_key, info: leaf.info })
}

/// Every certificate in `pem`, in order. The first one is the leaf.
pub fn parse_certificate_chain(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let chain: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(pem)
        .map(|result| {
            result.map_err(|err| TlsError::InvalidCertificatePem { source: anyhow!(err) })
        })
        .collect::<Result<_, _>>()?;

    if chain.is_empty() {
        return Err(TlsError::EmptyCertificateChain);
    }

    Ok(chain)
}

/// The first private key in `pem` (PKCS#1, SEC1 or PKCS#8).
pub fn parse_private_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, TlsError> {
    PrivateKeyDer::from_pem_slice(pem)
        .map_err(|err| TlsError::InvalidPrivateKey { source: Some(anyhow!(err)) })
}

/// CA certificates found in a PEM bundle.
#[derive(Debug, Default)]
pub struct CaBundle {
    pub certificates: Vec<CertificateDer<'static>>,
    /// Sections that could not be decoded.
    pub skipped: usize,
}

/// Collect the certificates of a CA bundle.
///
/// Blocks with other labels are ignored. Certificate blocks that do not decode
/// are counted in [`CaBundle::skipped`] and do not affect their neighbours.
pub fn parse_ca_bundle(data: &[u8]) -> CaBundle {
    let mut bundle = CaBundle::default();
    for section in pem_sections(data) {
        match CertificateDer::from_pem_slice(section) {
            Ok(cert) => bundle.certificates.push(cert),
            Err(PemError::NoItemsFound) => {}
            Err(err) => {
                debug!(error = %err, "Skipping undecodable CA bundle section");
                bundle.skipped += 1;
            }
        }
    }
    bundle
}

/// Split `data` into `-----BEGIN` .. `-----END` sections, end line included.
fn pem_sections(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    const BEGIN: &[u8] = b"-----BEGIN ";
    const END: &[u8] = b"-----END ";

    let mut rest = data;
    std::iter::from_fn(move || {
        let start = find(rest, BEGIN)?;
        let block = &rest[start..];
        let end = find(block, END)?;
        let tail = &block[end..];
        let line_end = tail.iter().position(|&b| b == b'\n').map_or(tail.len(), |pos| pos + 1);

        let (section, remainder) = block.split_at(end + line_end);
        rest = remainder;
        Some(section)
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Subject, issuer and validity of a DER certificate.
pub fn certificate_info(cert: &CertificateDer<'_>) -> Result<CertificateInfo, TlsError> {
    parse_leaf(cert).map(|leaf| leaf.info)
}

struct ParsedLeaf {
    info: CertificateInfo,
    algorithm_oid: String,
    public_key: Vec<u8>,
}

fn parse_leaf(cert: &CertificateDer<'_>) -> Result<ParsedLeaf, TlsError> {
    let (_, parsed) = X509Certificate::from_der(cert.as_ref())
        .map_err(|err| TlsError::CertificateMetadata { source: anyhow!("{err}") })?;

    let validity = parsed.validity();
    let info = CertificateInfo {
        subject: parsed.subject().to_string(),
        issuer: parsed.issuer().to_string(),
        not_before: to_chrono(validity.not_before.timestamp())?,
        not_after: to_chrono(validity.not_after.timestamp())?,
    };

    let spki = parsed.public_key();
    Ok(ParsedLeaf {
        info,
        algorithm_oid: spki.algorithm.algorithm.to_id_string(),
        public_key: spki.subject_public_key.data.to_vec(),
    })
}

fn to_chrono(timestamp: i64) -> Result<DateTime<Utc>, TlsError> {
    Utc.timestamp_opt(timestamp, 0).single().ok_or_else(|| TlsError::CertificateMetadata {
        source: anyhow!("certificate time {timestamp} out of range"),
    })
}

fn verify_key_matches(leaf: &ParsedLeaf, private_key: &PrivateKeyDer<'_>) -> Result<(), TlsError> {
    let key_bytes = private_key.secret_der();

    match (leaf.algorithm_oid.as_str(), private_key) {
        (OID_ED25519, PrivateKeyDer::Pkcs8(_)) => {
            let key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(key_bytes)
                .map_err(|_| TlsError::CertificateKeyMismatch)?;
            compare_bytes(key_pair.public_key().as_ref(), &leaf.public_key)
        }
        (OID_EC_PUBLIC_KEY, PrivateKeyDer::Pkcs8(_)) => {
            let rng = SystemRandom::new();
            if let Ok(key_pair) =
                EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, key_bytes, &rng)
            {
                return compare_bytes(key_pair.public_key().as_ref(), &leaf.public_key);
            }
            if let Ok(key_pair) =
                EcdsaKeyPair::from_pkcs8(&ECDSA_P384_SHA384_ASN1_SIGNING, key_bytes, &rng)
            {
                return compare_bytes(key_pair.public_key().as_ref(), &leaf.public_key);
            }
            Err(TlsError::CertificateKeyMismatch)
        }
        // ring cannot load bare SEC1 keys; rustls still validates the key itself.
        (OID_EC_PUBLIC_KEY, PrivateKeyDer::Sec1(_)) => {
            debug!("Skipping public key comparison for SEC1 encoded EC key");
            Ok(())
        }
        (OID_RSA_ENCRYPTION, PrivateKeyDer::Pkcs8(_)) => {
            let key_pair = RsaKeyPair::from_pkcs8(key_bytes)
                .map_err(|err| TlsError::InvalidPrivateKey { source: Some(anyhow!("{err}")) })?;
            compare_rsa_public_key(&key_pair, &leaf.public_key)
                .map_err(|_| TlsError::CertificateKeyMismatch)
        }
        (OID_RSA_ENCRYPTION, PrivateKeyDer::Pkcs1(_)) => {
            let key_pair = RsaKeyPair::from_der(key_bytes)
                .map_err(|err| TlsError::InvalidPrivateKey { source: Some(anyhow!("{err}")) })?;
            compare_rsa_public_key(&key_pair, &leaf.public_key)
                .map_err(|_| TlsError::CertificateKeyMismatch)
        }
        // Known certificate algorithm, key of a different family.
        (OID_ED25519 | OID_EC_PUBLIC_KEY | OID_RSA_ENCRYPTION, _) => {
            Err(TlsError::CertificateKeyMismatch)
        }
        _ => Ok(()),
    }
}

fn compare_bytes(expected: &[u8], actual: &[u8]) -> Result<(), TlsError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TlsError::CertificateKeyMismatch)
    }
}

fn compare_rsa_public_key(key_pair: &RsaKeyPair, public_key: &[u8]) -> anyhow::Result<()> {
    let (subject_modulus, subject_exponent) = rsa_components(public_key)?;
    let (key_modulus, key_exponent) = rsa_components(key_pair.public().as_ref())?;

    if subject_modulus == key_modulus && subject_exponent == key_exponent {
        Ok(())
    } else {
        Err(anyhow!("RSA key mismatch"))
    }
}

/// Modulus and exponent of a DER `RSAPublicKey`.
fn rsa_components(der: &[u8]) -> anyhow::Result<(Vec<u8>, Vec<u8>)> {
    let blocks = simple_asn1::from_der(der)?;
    let items = match blocks.first() {
        Some(ASN1Block::Sequence(_, items)) if items.len() >= 2 => items,
        _ => return Err(anyhow!("RSA public key is not a modulus/exponent sequence")),
    };

    match (&items[0], &items[1]) {
        (ASN1Block::Integer(_, modulus), ASN1Block::Integer(_, exponent)) => {
            Ok((bigint_to_bytes(modulus), bigint_to_bytes(exponent)))
        }
        _ => Err(anyhow!("RSA modulus/exponent missing")),
    }
}

fn bigint_to_bytes(value: &BigInt) -> Vec<u8> {
    value.to_biguint().map_or_else(Vec::new, |v| v.to_bytes_be())
}
