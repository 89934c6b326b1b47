use trustkeep::crypto::certificates::{load_client_identity, parse_ca_bundle};

use super::super::support::TestCertificateAuthority;

#[test]
fn test_certificate_authority_creation() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Test CA")?;

    let pem = ca.ca_cert_pem();
    assert!(pem.contains("BEGIN CERTIFICATE"), "Should be PEM format");
    assert_eq!(ca.root_store().len(), 1);

    Ok(())
}

#[test]
fn test_issued_client_certificate_loads_as_identity() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Test CA")?;
    let client = ca.issue_client_cert("endpoint-agent")?;

    let identity = load_client_identity(client.cert_pem.as_bytes(), client.key_pem.as_bytes())?;
    assert!(identity.info.subject.contains("CN=endpoint-agent"));
    assert!(identity.info.issuer.contains("CN=Test CA"));
    Ok(())
}

#[test]
fn test_ca_bundle_skips_malformed_sections() -> anyhow::Result<()> {
    let first = TestCertificateAuthority::new("CA One")?;
    let second = TestCertificateAuthority::new("CA Two")?;
    let bundle = format!(
        "{}-----BEGIN CERTIFICATE-----\n!!!!\n-----END CERTIFICATE-----\n{}",
        first.ca_cert_pem(),
        second.ca_cert_pem()
    );

    let parsed = parse_ca_bundle(bundle.as_bytes());
    assert_eq!(parsed.certificates.len(), 2);
    assert_eq!(parsed.skipped, 1);
    Ok(())
}
