use tempfile::TempDir;
use trustkeep::{create_tls_configuration, FileService, TlsConfiguration, TlsFileKind};

use super::super::support::{handshake, server_config, TestCertificateAuthority};

#[test]
fn test_endpoint_material_from_store_completes_mutual_tls() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Endpoint CA")?;
    let server = ca.issue_server_cert(&["localhost"])?;
    let client_cert = ca.issue_client_cert("agent")?;

    let dir = TempDir::new()?;
    let store = FileService::new(dir.path(), "storage")?;
    store.store_tls_file("endpoint-7", TlsFileKind::Ca, ca.ca_cert_pem().as_bytes())?;
    store.store_tls_file("endpoint-7", TlsFileKind::Cert, client_cert.cert_pem.as_bytes())?;
    store.store_tls_file("endpoint-7", TlsFileKind::Key, client_cert.key_pem.as_bytes())?;

    let settings = TlsConfiguration::from_store(&store, "endpoint-7", false)?;
    assert!(settings.has_client_identity());

    let tls = create_tls_configuration(&settings)?;
    let (_client, server_conn) =
        handshake(tls.client_config(), server_config(&server, Some(&ca))?, "localhost")?;
    assert!(server_conn.peer_certificates().is_some());
    Ok(())
}

#[test]
fn test_endpoint_with_only_ca_verifies_without_identity() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Endpoint CA")?;
    let server = ca.issue_server_cert(&["localhost"])?;

    let dir = TempDir::new()?;
    let store = FileService::new(dir.path(), "storage")?;
    store.store_tls_file("endpoint-8", TlsFileKind::Ca, ca.ca_cert_pem().as_bytes())?;

    let settings = TlsConfiguration::from_store(&store, "endpoint-8", false)?;
    assert!(!settings.has_client_identity());

    let tls = create_tls_configuration(&settings)?;
    assert!(!tls.presents_client_certificate());
    handshake(tls.client_config(), server_config(&server, None)?, "localhost")?;
    Ok(())
}

#[test]
fn test_deleted_endpoint_material_is_reported() -> anyhow::Result<()> {
    let ca = TestCertificateAuthority::new("Endpoint CA")?;

    let dir = TempDir::new()?;
    let store = FileService::new(dir.path(), "storage")?;
    store.store_tls_file("endpoint-9", TlsFileKind::Ca, ca.ca_cert_pem().as_bytes())?;
    let settings = TlsConfiguration::from_store(&store, "endpoint-9", false)?;

    store.delete_tls_files("endpoint-9")?;
    let err = create_tls_configuration(&settings).unwrap_err();
    assert!(matches!(err, trustkeep::TlsError::CaReadError { .. }));
    Ok(())
}
