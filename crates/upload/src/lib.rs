//! Chunked video upload over two WebSocket channels.
//!
//! A session opens the event channel, then the upload channel, sends a
//! metadata frame followed by the file in fixed-size binary chunks, and
//! watches the event channel for progress until the server reports
//! `complete` or `error`. After completion it polls job status until the
//! job finishes.

pub mod channel;
mod driver;
pub mod error;
pub mod poller;
mod session;
pub mod types;

#[cfg(test)]
mod testutil;

pub use error::{Channel, UploadError};
pub use poller::{StatusPoller, StatusSource};
pub use session::ChunkedUploadSession;
pub use types::{
    ChunkFraming, JobOutcome, NavigateTarget, NoticeLevel, SessionConfig, SessionEvent,
    SessionOutcome, TransferSummary,
};
