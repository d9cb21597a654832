//! Serialized form of a [`NodeBlob`].
//!
//! Decoding always re-validates the layout, so a loaded blob upholds the same invariants as one
//! produced by [`NodeBlob::build`].

use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{BtError, NodeBlob};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid blob: {0}")]
    Invalid(#[from] BtError),
}

pub fn to_msgpack(blob: &NodeBlob) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(blob)?)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<NodeBlob, WireError> {
    let blob: NodeBlob = decode::from_slice(bytes)?;
    blob.validate()?;
    Ok(blob)
}

pub fn to_json(blob: &NodeBlob) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(blob)?)
}

pub fn from_json(json: &str) -> Result<NodeBlob, WireError> {
    let blob: NodeBlob = serde_json::from_str(json)?;
    blob.validate()?;
    Ok(blob)
}

/// Deterministic content hash of a blob (FNV-1a over its MessagePack encoding).
pub fn blob_hash(blob: &NodeBlob) -> Result<u64, WireError> {
    let bytes = to_msgpack(blob)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
