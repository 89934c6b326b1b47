use std::sync::Arc;

use anyhow::Context;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose, PKCS_ECDSA_P256_SHA256,
};
use rustls::{
    pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer, ServerName},
    server::WebPkiClientVerifier,
    ClientConfig, ClientConnection, RootCertStore, ServerConfig, ServerConnection,
};

/// In-memory certificate authority issuing server and client certificates.
pub struct TestCertificateAuthority {
    cert: Certificate,
    key: KeyPair,
}

/// A PEM certificate and its private key.
pub struct IssuedCertificate {
    pub cert_pem: String,
    pub key_pem: String,
}

impl TestCertificateAuthority {
    pub fn new(common_name: &str) -> anyhow::Result<Self> {
        let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).context("generate CA key")?;
        let mut params = CertificateParams::new(Vec::<String>::new()).context("CA params")?;
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.distinguished_name.push(DnType::OrganizationName, "Trustkeep Test");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let cert = params.self_signed(&key).context("self-sign CA")?;
        Ok(Self { cert, key })
    }

    pub fn ca_cert_pem(&self) -> String {
        self.cert.pem()
    }

    pub fn root_store(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();
        roots.add(self.cert.der().clone()).expect("CA certificate is a valid trust anchor");
        roots
    }

    pub fn issue_server_cert(&self, dns_names: &[&str]) -> anyhow::Result<IssuedCertificate> {
        let names: Vec<String> = dns_names.iter().map(|name| name.to_string()).collect();
        let mut params = CertificateParams::new(names).context("server params")?;
        params
            .distinguished_name
            .push(DnType::CommonName, dns_names.first().copied().unwrap_or("server"));
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        self.issue(params)
    }

    pub fn issue_client_cert(&self, common_name: &str) -> anyhow::Result<IssuedCertificate> {
        let mut params = CertificateParams::new(Vec::<String>::new()).context("client params")?;
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        self.issue(params)
    }

    fn issue(&self, params: CertificateParams) -> anyhow::Result<IssuedCertificate> {
        let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).context("generate leaf key")?;
        let cert = params.signed_by(&key, &self.cert, &self.key).context("sign leaf")?;
        Ok(IssuedCertificate { cert_pem: cert.pem(), key_pem: key.serialize_pem() })
    }
}

impl IssuedCertificate {
    pub fn chain(&self) -> Vec<CertificateDer<'static>> {
        CertificateDer::pem_slice_iter(self.cert_pem.as_bytes())
            .collect::<Result<_, _>>()
            .expect("issued certificate PEM parses")
    }

    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::from_pem_slice(self.key_pem.as_bytes()).expect("issued key PEM parses")
    }
}

fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Server configuration presenting `identity`, optionally requiring client
/// certificates issued by `client_ca`.
pub fn server_config(
    identity: &IssuedCertificate,
    client_ca: Option<&TestCertificateAuthority>,
) -> anyhow::Result<Arc<ServerConfig>> {
    let builder = ServerConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .context("protocol versions")?;

    let builder = match client_ca {
        Some(ca) => {
            let verifier =
                WebPkiClientVerifier::builder_with_provider(Arc::new(ca.root_store()), provider())
                    .build()
                    .context("client verifier")?;
            builder.with_client_cert_verifier(verifier)
        }
        None => builder.with_no_client_auth(),
    };

    let config = builder
        .with_single_cert(identity.chain(), identity.private_key())
        .context("server certificate")?;
    Ok(Arc::new(config))
}

/// Run a handshake between `client` and a fresh connection on `server`
/// entirely in memory, returning both ends once neither is handshaking.
pub fn handshake(
    client: Arc<ClientConfig>,
    server: Arc<ServerConfig>,
    server_name: &'static str,
) -> Result<(ClientConnection, ServerConnection), rustls::Error> {
    let name = ServerName::try_from(server_name)
        .map_err(|err| rustls::Error::General(err.to_string()))?;
    let mut client = ClientConnection::new(client, name)?;
    let mut server = ServerConnection::new(server)?;

    for _ in 0..16 {
        if !client.is_handshaking() && !server.is_handshaking() {
            return Ok((client, server));
        }
        transfer(&mut *client, &mut *server)?;
        transfer(&mut *server, &mut *client)?;
    }

    Err(rustls::Error::General("handshake did not complete".into()))
}

fn transfer<A, B>(
    sender: &mut rustls::ConnectionCommon<A>,
    receiver: &mut rustls::ConnectionCommon<B>,
) -> Result<(), rustls::Error> {
    let mut buf = Vec::new();
    while sender.wants_write() {
        sender.write_tls(&mut buf).map_err(|err| rustls::Error::General(err.to_string()))?;
    }

    let mut pending = &buf[..];
    while !pending.is_empty() {
        receiver.read_tls(&mut pending).map_err(|err| rustls::Error::General(err.to_string()))?;
        receiver.process_new_packets()?;
    }
    Ok(())
}
