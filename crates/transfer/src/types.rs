use std::fmt;

use dubhub_protocol::ChunkHeader;
use dubhub_protocol::framing::checksum_bytes;

use crate::TransferError;
use crate::chunked::ChunkPlan;

/// A chunk of file data for transfer.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position in the chunk sequence (0-based).
    pub index: u64,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Tag describing this chunk on the wire. Hashes `data`, so only
    /// tagged framing pays for the checksum.
    pub fn header(&self) -> ChunkHeader {
        ChunkHeader {
            index: self.index,
            offset: self.offset,
            size: self.len(),
            checksum: checksum_bytes(&self.data),
        }
    }
}

/// Lifecycle of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    InProgress,
    /// Every chunk was handed to the upload channel.
    Sent,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Sent => "sent",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// State of one chunked upload.
///
/// Owned by the task driving the upload; `uploaded_bytes` only grows and
/// chunks are accepted strictly in plan order.
#[derive(Debug)]
pub struct UploadSession {
    id: String,
    project_id: u64,
    upload_token: String,
    upload_url: String,
    event_url: String,
    plan: ChunkPlan,
    current_chunk_index: u64,
    uploaded_bytes: u64,
    status: SessionStatus,
    error: String,
}

impl UploadSession {
    /// Creates a new pending session.
    pub fn new(
        project_id: u64,
        upload_token: impl Into<String>,
        upload_url: impl Into<String>,
        event_url: impl Into<String>,
        plan: ChunkPlan,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id,
            upload_token: upload_token.into(),
            upload_url: upload_url.into(),
            event_url: event_url.into(),
            plan,
            current_chunk_index: 0,
            uploaded_bytes: 0,
            status: SessionStatus::Pending,
            error: String::new(),
        }
    }

    /// Marks the session as in-progress.
    pub fn start(&mut self) {
        self.status = SessionStatus::InProgress;
    }

    /// Records that chunk `index` of `len` bytes was handed to the channel.
    ///
    /// Returns the new progress percentage.
    pub fn record_sent(&mut self, index: u64, len: u64) -> Result<u8, TransferError> {
        if self.status != SessionStatus::InProgress {
            return Err(TransferError::SessionNotActive(self.status.to_string()));
        }
        if index != self.current_chunk_index {
            return Err(TransferError::OutOfOrder {
                expected: self.current_chunk_index,
                got: index,
            });
        }
        let expected = self
            .plan
            .range(index)
            .map(|r| r.end - r.start)
            .ok_or(TransferError::OutOfOrder {
                expected: self.plan.total_chunks(),
                got: index,
            })?;
        if len != expected {
            return Err(TransferError::LengthMismatch {
                index,
                expected,
                actual: len,
            });
        }

        self.uploaded_bytes += len;
        self.current_chunk_index += 1;
        if self.current_chunk_index == self.plan.total_chunks() {
            self.status = SessionStatus::Sent;
        }
        Ok(self.percent())
    }

    /// Marks an empty source as fully sent.
    pub fn finish_empty(&mut self) {
        if self.plan.total_chunks() == 0 && self.status == SessionStatus::InProgress {
            self.status = SessionStatus::Sent;
        }
    }

    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
    }

    /// Marks the session as failed with an error message.
    pub fn fail(&mut self, err: &str) {
        self.status = SessionStatus::Failed;
        self.error = err.to_string();
    }

    pub fn cancel(&mut self) {
        self.status = SessionStatus::Cancelled;
    }

    /// `round(uploaded / size * 100)`; an empty source counts as 100.
    pub fn percent(&self) -> u8 {
        let size = self.plan.file_size();
        if size == 0 {
            return 100;
        }
        let scaled = (self.uploaded_bytes as u128 * 100 + size as u128 / 2) / size as u128;
        scaled.min(100) as u8
    }

    /// Returns true while chunks remain to be sent.
    pub fn has_pending_chunks(&self) -> bool {
        self.current_chunk_index < self.plan.total_chunks()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn upload_token(&self) -> &str {
        &self.upload_token
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn event_url(&self) -> &str {
        &self.event_url
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    pub fn total_chunks(&self) -> u64 {
        self.plan.total_chunks()
    }

    pub fn current_chunk_index(&self) -> u64 {
        self.current_chunk_index
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.plan.file_size() - self.uploaded_bytes
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn error(&self) -> &str {
        &self.error
    }
}
