use std::io::Read;
use std::ops::Range;
use std::path::Path;

use crate::TransferError;
use crate::types::Chunk;

// ---------------------------------------------------------------------------
// ChunkPlan
// ---------------------------------------------------------------------------

/// Fixed-size split of a byte source.
///
/// Chunk `i` covers `[i * chunk_size, min((i + 1) * chunk_size, file_size))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize);
        }
        Ok(Self {
            file_size,
            chunk_size,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// `ceil(file_size / chunk_size)`; zero for an empty source.
    pub fn total_chunks(&self) -> u64 {
        self.file_size.div_ceil(self.chunk_size)
    }

    /// Byte range of chunk `index`, or `None` past the end.
    pub fn range(&self, index: u64) -> Option<Range<u64>> {
        if index >= self.total_chunks() {
            return None;
        }
        let start = index * self.chunk_size;
        let end = (start + self.chunk_size).min(self.file_size);
        Some(start..end)
    }

    /// All chunk ranges in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        (0..self.total_chunks()).filter_map(|i| self.range(i))
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a byte source in planned chunks.
///
/// Every chunk is read fully before it is returned; a source that ends
/// early is an error rather than a short chunk.
pub struct ChunkReader<R = std::fs::File> {
    reader: R,
    plan: ChunkPlan,
    next_index: u64,
}

impl ChunkReader<std::fs::File> {
    /// Opens `path` for chunked reading.
    pub fn open(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        Self::new(file, file_size, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Wraps an arbitrary reader that yields exactly `file_size` bytes.
    pub fn new(reader: R, file_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        Ok(Self {
            reader,
            plan: ChunkPlan::new(file_size, chunk_size)?,
            next_index: 0,
        })
    }

    /// Reads the next chunk. Returns `None` once every chunk was read.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let Some(range) = self.plan.range(self.next_index) else {
            return Ok(None);
        };

        let mut data = vec![0u8; (range.end - range.start) as usize];
        self.reader.read_exact(&mut data)?;

        let chunk = Chunk {
            index: self.next_index,
            offset: range.start,
            data,
        };
        self.next_index += 1;
        Ok(Some(chunk))
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Index of the chunk the next call to `next_chunk` returns.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Chunks not yet read.
    pub fn remaining_chunks(&self) -> u64 {
        self.plan.total_chunks() - self.next_index
    }
}
