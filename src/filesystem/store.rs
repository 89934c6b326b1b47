//! On-disk artifact store.

use std::{
    fs::{self, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{
    paths::{
        self, TlsFileKind, COMPOSE_STORE_PATH, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE, TLS_STORE_PATH,
    },
    pem_file,
};
use crate::{
    config::StoreConfig,
    errors::{StoreError, StoreResult},
};

/// Manages TLS material, stack files and the instance key pair under a data root.
///
/// Every instance addresses its own roots, so isolated stores can coexist in
/// one process. Operations on the same folder key are not serialized here.
#[derive(Debug, Clone)]
pub struct FileService {
    data_store_path: PathBuf,
    file_store_path: PathBuf,
}

impl FileService {
    /// Initialize a store rooted at `data_store_path`, with artifacts kept in
    /// the `file_store_name` subdirectory. Missing directories are created.
    pub fn new(
        data_store_path: impl Into<PathBuf>,
        file_store_name: impl AsRef<Path>,
    ) -> StoreResult<Self> {
        let data_store_path = data_store_path.into();
        let service = Self {
            file_store_path: data_store_path.join(file_store_name),
            data_store_path,
        };

        create_directory(&service.data_store_path)?;
        service.create_directory_in_store(Path::new(TLS_STORE_PATH))?;
        service.create_directory_in_store(Path::new(COMPOSE_STORE_PATH))?;

        debug!(
            data_store_path = %service.data_store_path.display(),
            file_store_path = %service.file_store_path.display(),
            "Artifact store initialized"
        );

        Ok(service)
    }

    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        Self::new(&config.data_path, &config.file_store_name)
    }

    pub fn data_store_path(&self) -> &Path {
        &self.data_store_path
    }

    pub fn file_store_path(&self) -> &Path {
        &self.file_store_path
    }

    /// Store a TLS file for `folder`, replacing any previous file of the same kind.
    pub fn store_tls_file(
        &self,
        folder: &str,
        kind: TlsFileKind,
        reader: impl Read,
    ) -> StoreResult<()> {
        let _span = crate::artifact_span!("store_tls_file", folder, kind = %kind).entered();
        paths::validate_folder_key(folder)?;

        self.create_directory_in_store(&paths::tls_folder_path(folder))?;

        let target = self.file_store_path.join(paths::tls_file_path(folder, kind));
        let written = write_atomically(&target, reader)?;

        debug!(bytes = written, "Stored TLS file");
        Ok(())
    }

    /// Same as [`FileService::store_tls_file`] for a kind received as an integer code.
    pub fn store_tls_file_raw(
        &self,
        folder: &str,
        kind: i32,
        reader: impl Read,
    ) -> StoreResult<()> {
        let kind = TlsFileKind::try_from(kind)?;
        self.store_tls_file(folder, kind, reader)
    }

    /// Absolute path of a TLS file. Existence is not checked.
    pub fn get_path_for_tls_file(&self, folder: &str, kind: TlsFileKind) -> StoreResult<PathBuf> {
        paths::validate_folder_key(folder)?;
        Ok(self.file_store_path.join(paths::tls_file_path(folder, kind)))
    }

    pub fn get_path_for_tls_file_raw(&self, folder: &str, kind: i32) -> StoreResult<PathBuf> {
        let kind = TlsFileKind::try_from(kind)?;
        self.get_path_for_tls_file(folder, kind)
    }

    /// Remove a TLS folder and everything in it. A missing folder is not an error.
    pub fn delete_tls_files(&self, folder: &str) -> StoreResult<()> {
        paths::validate_folder_key(folder)?;
        let path = self.file_store_path.join(paths::tls_folder_path(folder));
        self.remove_directory(&path)?;

        debug!(folder, "Deleted TLS folder");
        Ok(())
    }

    /// Remove a single TLS file. Fails with `NotFound` when it does not exist.
    pub fn delete_tls_file(&self, folder: &str, kind: TlsFileKind) -> StoreResult<()> {
        let path = self.get_path_for_tls_file(folder, kind)?;
        fs::remove_file(&path).map_err(|e| StoreError::from_io(&path, e))?;

        debug!(folder, kind = %kind, "Deleted TLS file");
        Ok(())
    }

    /// Recursively remove a directory. A missing directory is not an error.
    pub fn remove_directory(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io { path: path.to_path_buf(), source: e }),
        }
    }

    /// Absolute directory of a stack project.
    pub fn get_stack_project_path(&self, stack_identifier: &str) -> PathBuf {
        self.file_store_path.join(paths::stack_store_path(stack_identifier))
    }

    /// Store a stack file from an in-memory string and return the project directory.
    pub fn store_stack_file_from_string(
        &self,
        stack_identifier: &str,
        file_name: &str,
        content: &str,
    ) -> StoreResult<PathBuf> {
        self.store_stack_file_from_reader(stack_identifier, file_name, content.as_bytes())
    }

    /// Store a stack file from a byte stream and return the project directory.
    pub fn store_stack_file_from_reader(
        &self,
        stack_identifier: &str,
        file_name: &str,
        reader: impl Read,
    ) -> StoreResult<PathBuf> {
        let _span = crate::artifact_span!("store_stack_file", stack_identifier, file_name)
            .entered();
        paths::validate_folder_key(stack_identifier)?;
        paths::validate_relative_file_name(file_name)?;

        let stack_store_path = paths::stack_store_path(stack_identifier);
        let relative_file = stack_store_path.join(file_name);

        // Includes may live in subdirectories of the project.
        let parent = relative_file.parent().unwrap_or(&stack_store_path);
        self.create_directory_in_store(parent)?;

        let written = write_atomically(&self.file_store_path.join(&relative_file), reader)?;
        debug!(bytes = written, "Stored stack file");

        Ok(self.file_store_path.join(stack_store_path))
    }

    /// Read a whole file as UTF-8 text.
    pub fn get_file_content(&self, path: impl AsRef<Path>) -> StoreResult<String> {
        let path = path.as_ref();
        fs::read_to_string(path).map_err(|e| StoreError::from_io(path, e))
    }

    /// Serialize `value` as JSON into `path`, truncating any previous content.
    pub fn write_json_to_file<T>(&self, path: impl AsRef<Path>, value: &T) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let path = path.as_ref();
        let content = serde_json::to_vec(value)
            .map_err(|source| StoreError::Serialization { path: path.to_path_buf(), source })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let mut file = options
            .open(path)
            .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        file.write_all(&content)
            .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;

        Ok(())
    }

    /// True only when both the private and the public key files exist.
    pub fn key_pair_files_exist(&self) -> StoreResult<bool> {
        for name in [PRIVATE_KEY_FILE, PUBLIC_KEY_FILE] {
            let path = self.data_store_path.join(name);
            let exists = path
                .try_exists()
                .map_err(|source| StoreError::Io { path: path.clone(), source })?;
            if !exists {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Write the instance key pair as two single-block PEM files.
    ///
    /// A failure on the second file leaves the pair indeterminate; callers
    /// must re-check [`FileService::key_pair_files_exist`] or store again.
    pub fn store_key_pair(
        &self,
        private_key: &[u8],
        public_key: &[u8],
        private_pem_label: &str,
        public_pem_label: &str,
    ) -> StoreResult<()> {
        self.create_pem_file(PRIVATE_KEY_FILE, private_pem_label, private_key)?;
        self.create_pem_file(PUBLIC_KEY_FILE, public_pem_label, public_key)?;

        debug!("Stored instance key pair");
        Ok(())
    }

    /// Load the decoded payloads of both key files. Labels are not checked.
    pub fn load_key_pair(&self) -> StoreResult<(Vec<u8>, Vec<u8>)> {
        let (_, private_key) = self.read_pem_file(PRIVATE_KEY_FILE)?;
        let (_, public_key) = self.read_pem_file(PUBLIC_KEY_FILE)?;
        Ok((private_key, public_key))
    }

    /// Load the key pair, requiring each file to carry the expected PEM label.
    pub fn load_key_pair_with_labels(
        &self,
        private_pem_label: &str,
        public_pem_label: &str,
    ) -> StoreResult<(Vec<u8>, Vec<u8>)> {
        let private_key = self.read_pem_file_expecting(PRIVATE_KEY_FILE, private_pem_label)?;
        let public_key = self.read_pem_file_expecting(PUBLIC_KEY_FILE, public_pem_label)?;
        Ok((private_key, public_key))
    }

    fn create_directory_in_store(&self, relative: &Path) -> StoreResult<()> {
        create_directory(&self.file_store_path.join(relative))
    }

    fn create_pem_file(&self, name: &str, label: &str, content: &[u8]) -> StoreResult<()> {
        let path = self.data_store_path.join(name);
        let encoded = pem_file::encode_block(label, content);
        write_atomically(&path, encoded.as_bytes())?;
        Ok(())
    }

    fn read_pem_file(&self, name: &str) -> StoreResult<(String, Vec<u8>)> {
        let path = self.data_store_path.join(name);
        let data = fs::read(&path).map_err(|e| StoreError::from_io(&path, e))?;
        pem_file::decode_single_block(&path, &data)
    }

    fn read_pem_file_expecting(&self, name: &str, expected: &str) -> StoreResult<Vec<u8>> {
        let (label, payload) = self.read_pem_file(name)?;
        if label != expected {
            return Err(StoreError::PemLabelMismatch {
                path: self.data_store_path.join(name),
                expected: expected.to_string(),
                found: label,
            });
        }
        Ok(payload)
    }
}

fn create_directory(path: &Path) -> StoreResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder
        .create(path)
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

/// Copy `reader` into a sibling temp file and rename it over `target` once complete.
///
/// A failed copy drops the temp file, so `target` keeps its previous state.
fn write_atomically(target: &Path, mut reader: impl Read) -> StoreResult<u64> {
    let dir = target.parent().ok_or_else(|| StoreError::Io {
        path: target.to_path_buf(),
        source: io::Error::other("artifact path has no parent directory"),
    })?;

    let io_error = |source| StoreError::Io { path: target.to_path_buf(), source };

    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    let written = io::copy(&mut reader, &mut temp).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(target).map_err(|err| io_error(err.error))?;

    Ok(written)
}
