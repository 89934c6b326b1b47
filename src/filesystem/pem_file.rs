//! Single-block PEM envelopes for the instance key pair.

use std::path::Path;

use pem::{EncodeConfig, LineEnding, Pem};

use crate::errors::{StoreError, StoreResult};

/// Wrap `contents` in one PEM block labelled `label`.
pub fn encode_block(label: &str, contents: &[u8]) -> String {
    let block = Pem::new(label, contents);
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Decode a file holding exactly one PEM block, returning its label and payload.
///
/// `path` is only used for error reporting.
pub fn decode_single_block(path: &Path, data: &[u8]) -> StoreResult<(String, Vec<u8>)> {
    let mut blocks = pem::parse_many(data)
        .map_err(|err| StoreError::corrupt_pem(path, err.to_string()))?;

    match blocks.len() {
        0 => Err(StoreError::corrupt_pem(path, "no PEM block found")),
        1 => {
            let block = blocks.remove(0);
            Ok((block.tag().to_string(), block.into_contents()))
        }
        n => Err(StoreError::corrupt_pem(path, format!("expected one PEM block, found {n}"))),
    }
}
