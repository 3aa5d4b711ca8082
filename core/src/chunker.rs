//! Chunker: splits a file into size-bounded, content-hashed chunks.

use crate::xxh64;
use dirsync_protocol::FileChunk;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const SMALL_CHUNK: u32 = 1_000;
const MEDIUM_CHUNK: u32 = 31_622;
const LARGE_CHUNK: u32 = 100_000;

const SMALL_THRESHOLD: u64 = 1_000_000;
const MEDIUM_THRESHOLD: u64 = 1_000_000_000;

/// Chooses a chunk size from a file's length, approximating √N so a manifest
/// never exceeds roughly 10K–30K chunks.
#[must_use]
pub fn chunk_size_for(file_len: u64) -> u32 {
    if file_len < SMALL_THRESHOLD {
        SMALL_CHUNK
    } else if file_len < MEDIUM_THRESHOLD {
        MEDIUM_CHUNK
    } else {
        LARGE_CHUNK
    }
}

/// Reads `path` sequentially, producing one `FileChunk` per non-empty read.
/// Deterministic for a given byte sequence; the trailing short read (if any)
/// becomes its own final chunk. An empty file yields an empty `Vec`.
pub fn chunk_file(path: &Path) -> io::Result<Vec<FileChunk>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let chunk_size = chunk_size_for(file_len) as usize;
    chunk_reader(file, chunk_size)
}

fn chunk_reader(mut reader: impl Read, chunk_size: usize) -> io::Result<Vec<FileChunk>> {
    let mut chunks = Vec::new();
    let mut buf = vec![0u8; chunk_size];

    loop {
        let read = read_up_to(&mut reader, &mut buf)?;
        if read == 0 {
            break;
        }
        chunks.push(FileChunk {
            size: read as u32,
            hash: xxh64(&buf[..read]),
        });
        if read < chunk_size {
            break;
        }
    }

    Ok(chunks)
}

/// Fills `buf` as much as possible from `reader`, stopping at EOF or once
/// `buf` is full — unlike `Read::read`, which may return fewer bytes than
/// requested even mid-stream.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn chunk_size_tiers_match_spec() {
        assert_eq!(chunk_size_for(0), 1_000);
        assert_eq!(chunk_size_for(999_999), 1_000);
        assert_eq!(chunk_size_for(1_000_000), 31_622);
        assert_eq!(chunk_size_for(999_999_999), 31_622);
        assert_eq!(chunk_size_for(1_000_000_000), 100_000);
        assert_eq!(chunk_size_for(50_000_000_000), 100_000);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = chunk_reader(Cursor::new(Vec::new()), 1_000).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn exact_multiple_of_chunk_size_has_no_short_trailing_chunk() {
        let data = vec![7u8; 2_000];
        let chunks = chunk_reader(Cursor::new(data), 1_000).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].size, 1_000);
        assert_eq!(chunks[1].size, 1_000);
    }

    #[test]
    fn trailing_short_read_is_its_own_chunk() {
        let data = vec![9u8; 2_500];
        let chunks = chunk_reader(Cursor::new(data), 1_000).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].size, 500);
    }

    #[test]
    fn deterministic_for_same_bytes() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(100);
        let a = chunk_reader(Cursor::new(data.clone()), 1_000).unwrap();
        let b = chunk_reader(Cursor::new(data), 1_000).unwrap();
        assert_eq!(a, b);
    }

    proptest::proptest! {
        #[test]
        fn prop_chunks_cover_all_bytes_contiguously(data in proptest::collection::vec(proptest::num::u8::ANY, 0..5_000), chunk_size in 1usize..2_000) {
            let chunks = chunk_reader(Cursor::new(data.clone()), chunk_size).unwrap();
            let total: usize = chunks.iter().map(|c| c.size as usize).sum();
            proptest::prop_assert_eq!(total, data.len());
            if !data.is_empty() {
                for c in &chunks[..chunks.len() - 1] {
                    proptest::prop_assert_eq!(c.size as usize, chunk_size);
                }
            }
        }
    }
}
