//! The synchronization engine shared between client and server: directory
//! fingerprinting, chunking, reconciliation planning,
//! delta-patch planning, and path-safety validation.

pub mod chunker;
pub mod delta;
pub mod fingerprint;
pub mod pathsafety;
pub mod reconcile;

pub use chunker::{chunk_file, chunk_size_for};
pub use delta::{compute_patches, Patch};
pub use fingerprint::{hash_file, walk_tree, FingerprintError};
pub use pathsafety::{validate_relative_path, PathSafetyError};
pub use reconcile::{plan, ReconcilePlan};

/// `XXH64` with seed `0` — the single hash function this system defines.
#[must_use]
pub fn xxh64(data: &[u8]) -> u64 {
    xxhash_rust::xxh64::xxh64(data, 0)
}
