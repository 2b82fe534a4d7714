//! Resumable chunked uploads against the storage network.
//!
//! An [`UploadHandle`] is a serializable session bound to one network
//! transaction; [`Uploader`] reconstructs a handle from its textual
//! encoding and drives it forward one chunk per network round-trip,
//! reporting progress after each committed chunk. Chunk signing and
//! transport belong to the [`ChunkCommitter`] implementation.

mod chunk;
mod handle;
mod uploader;

pub use chunk::{Chunk, checksum_bytes};
pub use handle::UploadHandle;
pub use uploader::{ChunkCommitter, CommitError, Uploader};

/// Default chunk size: 256 KiB — the storage network's chunk unit.
///
/// Every chunk of a session has this size except possibly the final one.
pub const DEFAULT_CHUNK_SIZE: u32 = 256 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("malformed upload handle: {0}")]
    Handle(#[from] serde_json::Error),

    #[error("invalid upload handle: {0}")]
    InvalidHandle(String),

    #[error("payload length {actual} does not match session size {expected}")]
    PayloadMismatch { expected: u64, actual: u64 },

    #[error("chunk commit failed: {0}")]
    Commit(#[from] CommitError),
}
