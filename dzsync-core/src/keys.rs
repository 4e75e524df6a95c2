//! Validator identity keys.
//!
//! Keypair files use the `solana-keygen` format: a JSON array of 64 bytes,
//! secret key first, public key in the last 32 bytes.

use std::path::Path;

use crate::error::{io_err, ConfigError};

const KEYPAIR_LEN: usize = 64;
const PUBKEY_LEN: usize = 32;

/// Public keys the identity gate compares the validator's identity against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKeys {
    pub active: String,
    pub passive: String,
}

/// Read a keypair file and return its base58 public key.
///
/// `key` names the config entry for error messages.
pub fn pubkey_from_keypair_file(key: &str, path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Keypair {
            key: key.to_string(),
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    pubkey_from_keypair_json(&contents).map_err(|reason| ConfigError::Keypair {
        key: key.to_string(),
        path: path.to_path_buf(),
        reason,
    })
}

/// Decode keypair JSON and base58-encode its public half.
pub fn pubkey_from_keypair_json(contents: &str) -> Result<String, String> {
    let bytes: Vec<u8> = serde_json::from_str(contents.trim())
        .map_err(|e| format!("expected a JSON array of bytes: {e}"))?;
    if bytes.len() != KEYPAIR_LEN {
        return Err(format!(
            "expected {KEYPAIR_LEN} bytes, found {}",
            bytes.len()
        ));
    }
    Ok(bs58::encode(&bytes[KEYPAIR_LEN - PUBKEY_LEN..]).into_string())
}
