use dubhub_protocol::ChunkHeader;
use dubhub_protocol::framing::decode_tagged;

use crate::TransferError;

/// Receiver-side check that tagged chunks arrive complete and in order.
#[derive(Debug, Default)]
pub struct ChunkSequencer {
    next_index: u64,
    next_offset: u64,
}

impl ChunkSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the next header. Rejects skipped, repeated or reordered
    /// chunks and non-contiguous offsets.
    pub fn accept(&mut self, header: &ChunkHeader) -> Result<(), TransferError> {
        if header.index != self.next_index {
            return Err(TransferError::OutOfOrder {
                expected: self.next_index,
                got: header.index,
            });
        }
        if header.offset != self.next_offset {
            return Err(TransferError::OffsetMismatch {
                expected: self.next_offset,
                got: header.offset,
            });
        }
        self.next_index += 1;
        self.next_offset += header.size;
        Ok(())
    }

    /// Decodes a tagged binary frame and validates its header.
    pub fn accept_frame<'a>(
        &mut self,
        frame: &'a [u8],
    ) -> Result<(ChunkHeader, &'a [u8]), TransferError> {
        let (header, data) = decode_tagged(frame)?;
        self.accept(&header)?;
        Ok((header, data))
    }

    /// Confirms that exactly `expected_size` bytes were received.
    pub fn finish(&self, expected_size: u64) -> Result<(), TransferError> {
        if self.next_offset != expected_size {
            return Err(TransferError::Incomplete {
                received: self.next_offset,
                expected: expected_size,
            });
        }
        Ok(())
    }

    pub fn received_chunks(&self) -> u64 {
        self.next_index
    }

    pub fn received_bytes(&self) -> u64 {
        self.next_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubhub_protocol::framing::encode_tagged;
    use std::io::Cursor;

    use crate::ChunkReader;

    fn header(index: u64, offset: u64, size: u64) -> ChunkHeader {
        ChunkHeader {
            index,
            offset,
            size,
            checksum: String::new(),
        }
    }

    #[test]
    fn accepts_contiguous_sequence() {
        let mut seq = ChunkSequencer::new();
        seq.accept(&header(0, 0, 4)).unwrap();
        seq.accept(&header(1, 4, 4)).unwrap();
        seq.accept(&header(2, 8, 2)).unwrap();
        seq.finish(10).unwrap();
        assert_eq!(seq.received_chunks(), 3);
    }

    #[test]
    fn flags_skipped_index() {
        let mut seq = ChunkSequencer::new();
        seq.accept(&header(0, 0, 4)).unwrap();
        let err = seq.accept(&header(2, 8, 2)).unwrap_err();
        assert!(matches!(
            err,
            TransferError::OutOfOrder {
                expected: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn flags_offset_gap() {
        let mut seq = ChunkSequencer::new();
        seq.accept(&header(0, 0, 4)).unwrap();
        assert!(matches!(
            seq.accept(&header(1, 5, 4)),
            Err(TransferError::OffsetMismatch {
                expected: 4,
                got: 5
            })
        ));
    }

    #[test]
    fn finish_detects_missing_tail() {
        let mut seq = ChunkSequencer::new();
        seq.accept(&header(0, 0, 4)).unwrap();
        assert!(matches!(
            seq.finish(10),
            Err(TransferError::Incomplete {
                received: 4,
                expected: 10
            })
        ));
    }

    #[test]
    fn tagged_frames_from_reader_are_contiguous() {
        let data = b"The quick brown fox jumps over the lazy dog".to_vec();
        let size = data.len() as u64;
        let mut reader = ChunkReader::new(Cursor::new(data.clone()), size, 10).unwrap();
        let mut seq = ChunkSequencer::new();
        let mut rebuilt = Vec::new();

        while let Some(chunk) = reader.next_chunk().unwrap() {
            let frame = encode_tagged(&chunk.header(), &chunk.data).unwrap();
            let (_, payload) = seq.accept_frame(&frame).unwrap();
            rebuilt.extend_from_slice(payload);
        }
        seq.finish(size).unwrap();
        assert_eq!(rebuilt, data);
    }
}
