//! Wire types for dubhub client-backend communication.
//!
//! Covers the REST bodies exchanged with the translation backend, the
//! frames carried by the event channel, the upload channel's metadata
//! frame and the tagged chunk framing.

pub mod api;
pub mod constants;
pub mod events;
pub mod framing;
pub mod types;

// Re-export primary types for convenience.
pub use api::{StartTranslationRequest, StartedTranslation};
pub use events::ProgressEvent;
pub use framing::{ChunkHeader, FramingError};
pub use types::{JobStatus, OperationType, UploadMetadata};
