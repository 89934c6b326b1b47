use std::fs;

use tempfile::TempDir;
use trustkeep::{
    create_tls_config, create_tls_configuration, TlsConfigBuilder, TlsConfiguration, TlsError,
};

use super::super::support::TestCertificateAuthority;

#[test]
fn test_every_flag_combination_builds() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Endpoint CA")?;
    let client = ca.issue_client_cert("agent")?;
    let ca_pem = ca.ca_cert_pem();

    for skip_client in [false, true] {
        for skip_server in [false, true] {
            let tls = create_tls_config(
                ca_pem.as_bytes(),
                client.cert_pem.as_bytes(),
                client.key_pem.as_bytes(),
                skip_client,
                skip_server,
            )?;

            assert_eq!(tls.presents_client_certificate(), !skip_client);
            assert_eq!(tls.verifies_server(), !skip_server);
            assert_eq!(tls.client_config().client_auth_cert_resolver.has_certs(), !skip_client);
        }
    }
    Ok(())
}

#[test]
fn test_skipping_both_ignores_all_inputs() {
    let tls = create_tls_config(&[0xff, 0x00], b"not a cert", b"not a key", true, true)
        .expect("inputs are ignored when both checks are skipped");
    assert!(!tls.presents_client_certificate());
    assert!(!tls.verifies_server());
}

#[test]
fn test_mismatched_key_is_invalid_certificate() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Endpoint CA")?;
    let client = ca.issue_client_cert("agent")?;
    let other = ca.issue_client_cert("other")?;

    let err = create_tls_config(
        ca.ca_cert_pem().as_bytes(),
        client.cert_pem.as_bytes(),
        other.key_pem.as_bytes(),
        false,
        true,
    )
    .unwrap_err();

    assert!(matches!(err, TlsError::CertificateKeyMismatch));
    assert!(err.is_invalid_certificate());
    Ok(())
}

#[test]
fn test_server_verification_without_usable_ca_still_builds() -> anyhow::Result<()> {
    let tls =
        TlsConfigBuilder::new().ca_certificate(b"garbage").skip_client_verification(true).build()?;
    assert!(tls.verifies_server());
    assert_eq!(tls.trust_anchor_count(), 0);
    Ok(())
}

#[test]
fn test_client_identity_metadata_is_exposed() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Endpoint CA")?;
    let client = ca.issue_client_cert("metadata-agent")?;

    let tls = TlsConfigBuilder::new()
        .ca_certificate(ca.ca_cert_pem().as_bytes())
        .client_identity(client.cert_pem.as_bytes(), client.key_pem.as_bytes())
        .build()?;

    let info = tls.client_identity().expect("client certificate presented");
    assert!(info.subject.contains("CN=metadata-agent"));
    assert_eq!(tls.trust_anchor_count(), 1);
    Ok(())
}

#[test]
fn test_path_variant_reads_files() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Endpoint CA")?;
    let client = ca.issue_client_cert("agent")?;
    let dir = TempDir::new()?;

    let ca_path = dir.path().join("ca.pem");
    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");
    fs::write(&ca_path, ca.ca_cert_pem())?;
    fs::write(&cert_path, &client.cert_pem)?;
    fs::write(&key_path, &client.key_pem)?;

    let settings = TlsConfiguration {
        tls: true,
        tls_skip_verify: false,
        tls_ca_cert_path: Some(ca_path),
        tls_cert_path: Some(cert_path),
        tls_key_path: Some(key_path.clone()),
    };
    let tls = create_tls_configuration(&settings)?;
    assert!(tls.presents_client_certificate());
    assert!(tls.verifies_server());

    fs::remove_file(&key_path)?;
    let err = create_tls_configuration(&settings).unwrap_err();
    assert!(matches!(err, TlsError::PrivateKeyReadError { path, .. } if path == key_path));
    Ok(())
}

#[test]
fn test_path_variant_missing_ca_file() {
    let settings = TlsConfiguration {
        tls: true,
        tls_ca_cert_path: Some("/nonexistent/trustkeep/ca.pem".into()),
        ..Default::default()
    };

    let err = create_tls_configuration(&settings).unwrap_err();
    assert!(matches!(err, TlsError::CaReadError { .. }));
    assert!(err.to_string().contains("/nonexistent/trustkeep/ca.pem"));
}

#[test]
fn test_path_variant_skip_verify_needs_no_ca() -> anyhow::Result<()> {
    let settings = TlsConfiguration { tls: true, tls_skip_verify: true, ..Default::default() };
    let tls = create_tls_configuration(&settings)?;
    assert!(!tls.verifies_server());
    assert!(!tls.presents_client_certificate());
    Ok(())
}
