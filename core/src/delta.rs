//! Delta-patch engine: compares a local file against a remote
//! chunk manifest and produces the minimal set of byte-range patches needed
//! to bring the remote copy in line.

use crate::xxh64;
use dirsync_protocol::FileChunk;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// One byte-range write the client should send as `PATCH files?path=P&offset=O[&end=1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub offset: u64,
    pub data: Vec<u8>,
    /// When set, the server truncates the file to `offset + data.len()` after
    /// applying this patch.
    pub end: bool,
}

/// Walks `local_path` against `remote_chunks` (as returned by `GET meta`) and
/// returns the patches needed to make the remote file match. Produces zero
/// patches for identical content; a file strictly shorter
/// locally than the remote manifest describes is communicated by a single
/// terminal `end=1` patch; a file strictly longer is communicated by
/// chunk-mismatch patches plus one trailing `end=1` append.
pub fn compute_patches(local_path: &Path, remote_chunks: &[FileChunk]) -> io::Result<Vec<Patch>> {
    let mut file = File::open(local_path)?;
    let mut patches = Vec::new();
    let mut position: u64 = 0;

    for chunk in remote_chunks {
        let mut buf = vec![0u8; chunk.size as usize];
        let read = read_up_to(&mut file, &mut buf)?;
        let offset = position;

        if read < buf.len() {
            buf.truncate(read);
            patches.push(Patch {
                offset,
                data: buf,
                end: true,
            });
            position += read as u64;
            return Ok(patches);
        }

        if xxh64(&buf) != chunk.hash {
            patches.push(Patch {
                offset,
                data: buf,
                end: false,
            });
        }
        position += read as u64;
    }

    let mut remainder = Vec::new();
    file.read_to_end(&mut remainder)?;
    if !remainder.is_empty() {
        patches.push(Patch {
            offset: position,
            data: remainder,
            end: true,
        });
    }

    Ok(patches)
}

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
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    fn chunk(data: &[u8]) -> FileChunk {
        FileChunk {
            size: data.len() as u32,
            hash: xxh64(data),
        }
    }

    #[test]
    fn identical_content_produces_no_patches() {
        let content = b"hello world!";
        let file = write_temp(content);
        let remote = vec![chunk(content)];
        let patches = compute_patches(file.path(), &remote).unwrap();
        assert!(patches.is_empty());
    }

    #[test]
    fn changed_chunk_produces_one_patch_at_its_offset() {
        let local = b"AAAABBBB";
        let file = write_temp(local);
        let remote = vec![chunk(b"AAAA"), chunk(b"XXXX")];
        let patches = compute_patches(file.path(), &remote).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].offset, 4);
        assert_eq!(patches[0].data, b"BBBB");
        assert!(!patches[0].end);
    }

    #[test]
    fn locally_shorter_file_emits_single_terminal_patch() {
        let local = b"AAAA";
        let file = write_temp(local);
        let remote = vec![chunk(b"AAAA"), chunk(b"BBBB")];
        let patches = compute_patches(file.path(), &remote).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].offset, 4);
        assert!(patches[0].data.is_empty());
        assert!(patches[0].end);
    }

    #[test]
    fn locally_shorter_mid_chunk_sends_partial_bytes_with_end_flag() {
        let local = b"AAAABB";
        let file = write_temp(local);
        let remote = vec![chunk(b"AAAA"), chunk(b"BBBB")];
        let patches = compute_patches(file.path(), &remote).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].offset, 4);
        assert_eq!(patches[0].data, b"BB");
        assert!(patches[0].end);
    }

    #[test]
    fn locally_longer_file_appends_trailing_end_patch() {
        let local = b"AAAABBBBCCCC";
        let file = write_temp(local);
        let remote = vec![chunk(b"AAAA"), chunk(b"BBBB")];
        let patches = compute_patches(file.path(), &remote).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].offset, 8);
        assert_eq!(patches[0].data, b"CCCC");
        assert!(patches[0].end);
    }

    #[test]
    fn empty_remote_manifest_on_nonempty_local_file_is_full_upload() {
        let local = b"fresh content";
        let file = write_temp(local);
        let patches = compute_patches(file.path(), &[]).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].offset, 0);
        assert_eq!(patches[0].data, local);
        assert!(patches[0].end);
    }

    #[test]
    fn empty_remote_manifest_on_empty_local_file_produces_no_patches() {
        let file = write_temp(b"");
        let patches = compute_patches(file.path(), &[]).unwrap();
        assert!(patches.is_empty());
    }
}
