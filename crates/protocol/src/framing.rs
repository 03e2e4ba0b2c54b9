//! Tagged chunk framing for the upload channel.
//!
//! # Wire format
//!
//! ```text
//! [4 bytes BE: header_len]
//! [header_len bytes: JSON ChunkHeader]
//! [remaining bytes: chunk data]
//! ```
//!
//! Each binary frame carries exactly one chunk, so the data length is the
//! frame length minus the header. The header lets the receiver detect gaps
//! or reordering instead of trusting transport order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Upper bound on the JSON header size.
pub const MAX_HEADER_LEN: usize = 4096;

/// Per-chunk tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkHeader {
    pub index: u64,
    pub offset: u64,
    pub size: u64,
    /// Lowercase hex SHA-256 of the chunk data.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("frame too short: {0} bytes")]
    Truncated(usize),

    #[error("header length {0} exceeds limit")]
    HeaderTooLarge(usize),

    #[error("invalid chunk header: {0}")]
    Header(#[from] serde_json::Error),

    #[error("size mismatch: header says {expected}, frame carries {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("checksum mismatch for chunk {index}")]
    Checksum { index: u64 },
}

/// Returns the lowercase hex SHA-256 digest of `data`.
pub fn checksum_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Builds one tagged binary frame.
pub fn encode_tagged(header: &ChunkHeader, data: &[u8]) -> Result<Vec<u8>, FramingError> {
    let header_json = serde_json::to_vec(header)?;
    if header_json.len() > MAX_HEADER_LEN {
        return Err(FramingError::HeaderTooLarge(header_json.len()));
    }
    let mut frame = Vec::with_capacity(4 + header_json.len() + data.len());
    frame.extend_from_slice(&(header_json.len() as u32).to_be_bytes());
    frame.extend_from_slice(&header_json);
    frame.extend_from_slice(data);
    Ok(frame)
}

/// Splits a tagged frame into its header and data, verifying size and
/// checksum when present.
pub fn decode_tagged(frame: &[u8]) -> Result<(ChunkHeader, &[u8]), FramingError> {
    if frame.len() < 4 {
        return Err(FramingError::Truncated(frame.len()));
    }
    let header_len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    if header_len > MAX_HEADER_LEN {
        return Err(FramingError::HeaderTooLarge(header_len));
    }
    let rest = &frame[4..];
    if rest.len() < header_len {
        return Err(FramingError::Truncated(frame.len()));
    }
    let (header_bytes, data) = rest.split_at(header_len);
    let header: ChunkHeader = serde_json::from_slice(header_bytes)?;

    if header.size != data.len() as u64 {
        return Err(FramingError::SizeMismatch {
            expected: header.size,
            actual: data.len() as u64,
        });
    }
    if !header.checksum.is_empty() && header.checksum != checksum_bytes(data) {
        return Err(FramingError::Checksum {
            index: header.index,
        });
    }
    Ok((header, data))
}
