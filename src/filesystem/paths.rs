//! Canonical on-disk layout of the artifact store.
//!
//! Everything here is pure path arithmetic. Paths are relative to the file
//! root except the key pair files, which live directly in the data root.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreResult};

/// Subfolder of the file root holding per-endpoint TLS material.
pub const TLS_STORE_PATH: &str = "tls";
/// TLS folder key used for the LDAP server's TLS material.
pub const LDAP_STORE_PATH: &str = "ldap";
/// File name of a stored CA certificate.
pub const TLS_CA_CERT_FILE: &str = "ca.pem";
/// File name of a stored client certificate.
pub const TLS_CERT_FILE: &str = "cert.pem";
/// File name of a stored client private key.
pub const TLS_KEY_FILE: &str = "key.pem";
/// Subfolder of the file root holding stack definitions.
pub const COMPOSE_STORE_PATH: &str = "compose";
/// Default name of a stack definition file.
pub const COMPOSE_FILE_DEFAULT_NAME: &str = "docker-compose.yml";
/// Name of the instance private key file in the data root.
pub const PRIVATE_KEY_FILE: &str = "portainer.key";
/// Name of the instance public key file in the data root.
pub const PUBLIC_KEY_FILE: &str = "portainer.pub";

/// The closed set of TLS files an endpoint folder can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsFileKind {
    Ca,
    Cert,
    Key,
}

impl TlsFileKind {
    pub const ALL: [TlsFileKind; 3] = [TlsFileKind::Ca, TlsFileKind::Cert, TlsFileKind::Key];

    /// File name used on disk for this kind.
    pub fn file_name(self) -> &'static str {
        match self {
            TlsFileKind::Ca => TLS_CA_CERT_FILE,
            TlsFileKind::Cert => TLS_CERT_FILE,
            TlsFileKind::Key => TLS_KEY_FILE,
        }
    }

    /// Integer code used by API clients (0 = CA, 1 = certificate, 2 = key).
    pub fn code(self) -> i32 {
        match self {
            TlsFileKind::Ca => 0,
            TlsFileKind::Cert => 1,
            TlsFileKind::Key => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TlsFileKind::Ca => "ca",
            TlsFileKind::Cert => "cert",
            TlsFileKind::Key => "key",
        }
    }
}

impl fmt::Display for TlsFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for TlsFileKind {
    type Error = StoreError;

    fn try_from(code: i32) -> StoreResult<Self> {
        match code {
            0 => Ok(TlsFileKind::Ca),
            1 => Ok(TlsFileKind::Cert),
            2 => Ok(TlsFileKind::Key),
            other => Err(StoreError::unsupported_kind(other)),
        }
    }
}

impl FromStr for TlsFileKind {
    type Err = StoreError;

    fn from_str(value: &str) -> StoreResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ca" => Ok(TlsFileKind::Ca),
            "cert" => Ok(TlsFileKind::Cert),
            "key" => Ok(TlsFileKind::Key),
            _ => Err(StoreError::unsupported_kind(value)),
        }
    }
}

/// Reject folder keys and stack identifiers that are not a single normal path component.
pub fn validate_folder_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::invalid_name(key, "name cannot be empty"));
    }
    if key.contains('/') || key.contains('\\') || key.contains('\0') {
        return Err(StoreError::invalid_name(key, "name cannot contain path separators"));
    }

    let mut components = Path::new(key).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StoreError::invalid_name(key, "name must be a single path component")),
    }
}

/// Reject stack file names that are absolute or climb out of the stack folder.
pub fn validate_relative_file_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid_name(name, "file name cannot be empty"));
    }
    if name.contains('\0') {
        return Err(StoreError::invalid_name(name, "file name cannot contain NUL"));
    }

    let path = Path::new(name);
    let mut saw_normal = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => saw_normal = true,
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(StoreError::invalid_name(name, "file name cannot contain '..'"))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(StoreError::invalid_name(name, "file name must be relative"))
            }
        }
    }

    if saw_normal {
        Ok(())
    } else {
        Err(StoreError::invalid_name(name, "file name must name a file"))
    }
}

/// `tls/<folder>`
pub fn tls_folder_path(folder: &str) -> PathBuf {
    Path::new(TLS_STORE_PATH).join(folder)
}

/// `tls/<folder>/<file name for kind>`
pub fn tls_file_path(folder: &str, kind: TlsFileKind) -> PathBuf {
    tls_folder_path(folder).join(kind.file_name())
}

/// `compose/<stack id>`
pub fn stack_store_path(stack_identifier: &str) -> PathBuf {
    Path::new(COMPOSE_STORE_PATH).join(stack_identifier)
}
