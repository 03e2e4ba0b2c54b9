//! Chunk planning, file chunk reading and upload session bookkeeping.

mod chunked;
mod progress;
mod sequencer;
mod types;
mod validation;

pub use chunked::{ChunkPlan, ChunkReader};
pub use progress::{SpeedCalculator, TransferProgress};
pub use sequencer::ChunkSequencer;
pub use types::{Chunk, SessionStatus, UploadSession};
pub use validation::{file_extension, validate_source_file};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk size must be positive")]
    InvalidChunkSize,

    #[error("invalid source file: {0}")]
    InvalidSource(String),

    #[error("chunk out of order: expected {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("chunk offset mismatch: expected {expected}, got {got}")]
    OffsetMismatch { expected: u64, got: u64 },

    #[error("chunk {index} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        index: u64,
        expected: u64,
        actual: u64,
    },

    #[error("transfer incomplete: {received} of {expected} bytes")]
    Incomplete { received: u64, expected: u64 },

    #[error("session not active: {0}")]
    SessionNotActive(String),

    #[error(transparent)]
    Framing(#[from] dubhub_protocol::FramingError),
}
