//! Wire types shared by the dirsync client and server: the binary codec used
//! for the `meta` endpoint, the `DirEntry`/`FileChunk` data model, and the
//! query-string helpers that reproduce the transport's double percent-encoding.

pub mod chunk;
pub mod codec;
pub mod entry;
pub mod query;

pub use chunk::{FileChunk, MetaPayload};
pub use codec::{BinaryReader, BinaryWriter, CodecError};
pub use entry::{DirEntry, EntryType};
