use sha2::{Digest, Sha256};

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// One chunk of payload data staged for commit.
///
/// Borrows its byte range from the caller's payload; the digest covers
/// exactly that range and rides along so the network client can submit it
/// without re-hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk<'a> {
    /// Transaction the chunk belongs to.
    pub tx_id: &'a str,
    /// Byte offset within the transaction data.
    pub offset: u64,
    /// Raw chunk bytes.
    pub data: &'a [u8],
    /// SHA-256 hex digest of `data`.
    pub checksum: String,
}

impl<'a> Chunk<'a> {
    /// Stages a chunk, computing its digest.
    pub fn new(tx_id: &'a str, offset: u64, data: &'a [u8]) -> Self {
        Self {
            tx_id,
            offset,
            data,
            checksum: checksum_bytes(data),
        }
    }
}
