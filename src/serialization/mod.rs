//! CBOR encoding for stored session state.
//!
//! - CBOR via `ciborium`, never JSON, for anything written to disk
//! - Encoding is deterministic, so a SHA-256 over the bytes is a stable
//!   fingerprint of the state
//! - New fields must carry `#[serde(default)]` so older files still decode

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),
}

/// Serialize to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| SerializationError::Encode(format!("{:?}", e)))?;
    Ok(bytes)
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}

/// Hex SHA-256 of the CBOR encoding of `value`.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let bytes = to_cbor(value)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
