use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    errors::StoreResult,
    filesystem::{FileService, TlsFileKind},
};

/// TLS settings of a remote endpoint, pointing at material on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfiguration {
    /// Use TLS when dialing the endpoint.
    #[serde(rename = "TLS")]
    pub tls: bool,

    /// Accept any server certificate.
    #[serde(rename = "TLSSkipVerify")]
    pub tls_skip_verify: bool,

    #[serde(rename = "TLSCACert", default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert_path: Option<PathBuf>,

    #[serde(rename = "TLSCert", default, skip_serializing_if = "Option::is_none")]
    pub tls_cert_path: Option<PathBuf>,

    #[serde(rename = "TLSKey", default, skip_serializing_if = "Option::is_none")]
    pub tls_key_path: Option<PathBuf>,
}

impl TlsConfiguration {
    /// Point at whichever of the endpoint's TLS files are present in `store`.
    pub fn from_store(
        store: &FileService,
        folder: &str,
        tls_skip_verify: bool,
    ) -> StoreResult<Self> {
        let existing = |kind: TlsFileKind| -> StoreResult<Option<PathBuf>> {
            let path = store.get_path_for_tls_file(folder, kind)?;
            Ok(path.is_file().then_some(path))
        };

        Ok(Self {
            tls: true,
            tls_skip_verify,
            tls_ca_cert_path: existing(TlsFileKind::Ca)?,
            tls_cert_path: existing(TlsFileKind::Cert)?,
            tls_key_path: existing(TlsFileKind::Key)?,
        })
    }

    /// Both halves of a client identity are configured.
    pub fn has_client_identity(&self) -> bool {
        self.tls && self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }
}
