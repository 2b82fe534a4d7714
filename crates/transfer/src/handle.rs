use std::ops::Range;

use serde::{Deserialize, Serialize};

use permaflow_protocol::types::ProgressRecord;

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Resumable upload session bound to one storage-network transaction.
///
/// The handle is the single source of truth for upload progress: the
/// driver mutates it in place as chunks commit, and its JSON encoding is
/// the textual form handed between execution contexts. Completion and the
/// total chunk count are derived from the committed-chunk count, so
/// `uploaded_chunks == total_chunks` and `is_complete` cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadHandle {
    tx_id: String,
    data_size: u64,
    chunk_size: u32,
    uploaded_chunks: u32,
}

impl UploadHandle {
    /// Creates a fresh handle for `data_size` bytes of transaction
    /// `tx_id`. A `chunk_size` of 0 selects [`DEFAULT_CHUNK_SIZE`].
    pub fn new(tx_id: impl Into<String>, data_size: u64, chunk_size: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            data_size,
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                chunk_size
            },
            uploaded_chunks: 0,
        }
    }

    /// Reconstructs a handle from its textual encoding.
    ///
    /// Fails on malformed JSON and on handles whose state violates the
    /// session invariants (zero chunk size, more chunks committed than the
    /// session has).
    pub fn from_json(serialized: &str) -> Result<Self, TransferError> {
        let handle: Self = serde_json::from_str(serialized)?;
        handle.validate()?;
        Ok(handle)
    }

    /// Returns the textual encoding of the handle.
    pub fn to_json(&self) -> Result<String, TransferError> {
        Ok(serde_json::to_string(self)?)
    }

    fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::InvalidHandle("chunk size is zero".into()));
        }
        if self.uploaded_chunks > self.total_chunks() {
            return Err(TransferError::InvalidHandle(format!(
                "{} chunks committed but session has {}",
                self.uploaded_chunks,
                self.total_chunks()
            )));
        }
        Ok(())
    }

    /// Transaction the session is bound to.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Total byte size of the transaction data.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Chunk size; every chunk except possibly the last has this size.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Number of chunks already committed to the network.
    pub fn uploaded_chunks(&self) -> u32 {
        self.uploaded_chunks
    }

    /// Total number of chunks in the session.
    pub fn total_chunks(&self) -> u32 {
        self.data_size.div_ceil(u64::from(self.chunk_size)) as u32
    }

    /// `true` once every chunk has been committed.
    pub fn is_complete(&self) -> bool {
        self.uploaded_chunks == self.total_chunks()
    }

    /// Completion percentage, 0-100.
    pub fn pct_complete(&self) -> u8 {
        self.progress().pct
    }

    /// Progress snapshot for the current state.
    pub fn progress(&self) -> ProgressRecord {
        ProgressRecord::new(self.uploaded_chunks, self.total_chunks())
    }

    /// Byte range of the next chunk to commit, or `None` when complete.
    pub fn next_chunk_range(&self) -> Option<Range<usize>> {
        if self.is_complete() {
            return None;
        }
        let start = u64::from(self.uploaded_chunks) * u64::from(self.chunk_size);
        let end = (start + u64::from(self.chunk_size)).min(self.data_size);
        Some(start as usize..end as usize)
    }

    /// Records that the next chunk was acknowledged by the network.
    ///
    /// No-op on a complete handle.
    pub fn advance(&mut self) {
        if !self.is_complete() {
            self.uploaded_chunks += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_starts_at_zero() {
        let handle = UploadHandle::new("tx-1", 1000, 400);
        assert_eq!(handle.uploaded_chunks(), 0);
        assert_eq!(handle.total_chunks(), 3);
        assert!(!handle.is_complete());
        assert_eq!(handle.pct_complete(), 0);
    }

    #[test]
    fn zero_chunk_size_selects_default() {
        let handle = UploadHandle::new("tx-1", 1, 0);
        assert_eq!(handle.chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn short_final_chunk() {
        let handle = UploadHandle::new("tx-1", 10, 4);
        assert_eq!(handle.total_chunks(), 3);

        let mut handle = handle;
        assert_eq!(handle.next_chunk_range(), Some(0..4));
        handle.advance();
        assert_eq!(handle.next_chunk_range(), Some(4..8));
        handle.advance();
        assert_eq!(handle.next_chunk_range(), Some(8..10));
        handle.advance();
        assert_eq!(handle.next_chunk_range(), None);
        assert!(handle.is_complete());
    }

    #[test]
    fn advance_is_noop_when_complete() {
        let mut handle = UploadHandle::new("tx-1", 4, 4);
        handle.advance();
        assert!(handle.is_complete());
        handle.advance();
        assert_eq!(handle.uploaded_chunks(), 1);
    }

    #[test]
    fn exact_multiple_has_no_short_chunk() {
        let handle = UploadHandle::new("tx-1", 8, 4);
        assert_eq!(handle.total_chunks(), 2);
    }

    #[test]
    fn empty_session_is_complete_on_arrival() {
        let handle = UploadHandle::new("tx-1", 0, 4);
        assert_eq!(handle.total_chunks(), 0);
        assert!(handle.is_complete());
        assert_eq!(handle.next_chunk_range(), None);
    }

    #[test]
    fn progress_tracks_chunks() {
        let mut handle = UploadHandle::new("tx-1", 12, 4);
        handle.advance();
        let rec = handle.progress();
        assert_eq!(rec.completed_chunks, 1);
        assert_eq!(rec.total_chunks, 3);
        assert_eq!(rec.pct, 33);
        assert!(!rec.is_complete);
    }

    #[test]
    fn json_roundtrip_preserves_progress() {
        let mut handle = UploadHandle::new("tx-1", 1000, 400);
        handle.advance();

        let json = handle.to_json().unwrap();
        let back = UploadHandle::from_json(&json).unwrap();
        assert_eq!(back, handle);
        assert_eq!(back.uploaded_chunks(), 1);
    }

    #[test]
    fn wire_fields_are_camel_case() {
        let handle = UploadHandle::new("tx-1", 10, 4);
        let json = handle.to_json().unwrap();
        assert!(json.contains("\"txId\""));
        assert!(json.contains("\"dataSize\""));
        assert!(json.contains("\"chunkSize\""));
        assert!(json.contains("\"uploadedChunks\""));
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        let result = UploadHandle::from_json("not json at all");
        assert!(matches!(result, Err(TransferError::Handle(_))));
    }

    #[test]
    fn from_json_rejects_zero_chunk_size() {
        let json = r#"{"txId":"t","dataSize":10,"chunkSize":0,"uploadedChunks":0}"#;
        let result = UploadHandle::from_json(json);
        assert!(matches!(result, Err(TransferError::InvalidHandle(_))));
    }

    #[test]
    fn from_json_rejects_overcommitted_handle() {
        let json = r#"{"txId":"t","dataSize":10,"chunkSize":4,"uploadedChunks":4}"#;
        let result = UploadHandle::from_json(json);
        assert!(matches!(result, Err(TransferError::InvalidHandle(_))));
    }
}
