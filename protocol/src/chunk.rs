//! `FileChunk` and the meta payload wire format.

use crate::codec::{BinaryReader, BinaryWriter, CodecError};

/// One byte-range descriptor for delta sync. Chunks of a file are emitted in
/// sequential, contiguous, non-overlapping order starting at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileChunk {
    pub size: u32,
    pub hash: u64,
}

const FILE_TAG: u8 = 1;
const NON_FILE_TAG: u8 = 0;

/// The on-wire form of a file's chunk manifest returned by `GET meta`: a
/// single tag byte (1 = file, 0 = non-file) followed by `(size, hash)` pairs.
/// Total length is always `1 + 12*N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaPayload {
    pub is_file: bool,
    pub chunks: Vec<FileChunk>,
}

impl MetaPayload {
    #[must_use]
    pub fn for_file(chunks: Vec<FileChunk>) -> Self {
        Self {
            is_file: true,
            chunks,
        }
    }

    #[must_use]
    pub fn non_file() -> Self {
        Self {
            is_file: false,
            chunks: Vec::new(),
        }
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = BinaryWriter::with_capacity(1 + 12 * self.chunks.len());
        w.write_u8(if self.is_file { FILE_TAG } else { NON_FILE_TAG });
        if self.is_file {
            for chunk in &self.chunks {
                w.write_u32(chunk.size);
                w.write_u64(chunk.hash);
            }
        }
        w.into_bytes()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = BinaryReader::new(data);
        let is_file = r.read_u8()? == FILE_TAG;
        let mut chunks = Vec::new();
        if is_file {
            while r.bytes_remaining() > 0 {
                let size = r.read_u32()?;
                let hash = r.read_u64()?;
                chunks.push(FileChunk { size, hash });
            }
        }
        Ok(Self { is_file, chunks })
    }
}
