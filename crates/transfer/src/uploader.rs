use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use permaflow_protocol::types::ProgressRecord;

use crate::chunk::Chunk;
use crate::handle::UploadHandle;
use crate::TransferError;

/// Error returned by a [`ChunkCommitter`] for a single chunk.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("network error: {0}")]
    Network(String),

    #[error("chunk rejected by the network (status {0})")]
    Rejected(u16),
}

/// Storage-network client able to commit one chunk of a session.
///
/// Implementations own signing and transport; the driver only sequences
/// calls and never retries a failed commit.
pub trait ChunkCommitter: Send + Sync {
    /// Commits `chunk` to the network-side session and waits for the
    /// acknowledgement.
    fn commit_chunk<'a>(
        &'a self,
        chunk: &'a Chunk<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommitError>> + Send + 'a>>;
}

impl<C: ChunkCommitter + ?Sized> ChunkCommitter for std::sync::Arc<C> {
    fn commit_chunk<'a>(
        &'a self,
        chunk: &'a Chunk<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommitError>> + Send + 'a>> {
        (**self).commit_chunk(chunk)
    }
}

/// Drives a resumable upload session one chunk at a time.
pub struct Uploader<C> {
    committer: C,
}

impl<C: ChunkCommitter> Uploader<C> {
    pub fn new(committer: C) -> Self {
        Self { committer }
    }

    /// Reconstructs the session handle from its textual encoding and
    /// checks that `payload` is the byte sequence the session expects.
    pub fn get_uploader(
        &self,
        serialized: &str,
        payload: &[u8],
    ) -> Result<UploadHandle, TransferError> {
        let handle = UploadHandle::from_json(serialized)?;
        check_payload(&handle, payload)?;
        Ok(handle)
    }

    /// Commits the remaining chunks of `payload` strictly in order,
    /// sending one [`ProgressRecord`] after each acknowledged chunk.
    ///
    /// There is no internal retry: the first rejected commit returns the
    /// error with `handle` still positioned at its last committed chunk,
    /// so calling `drive` again resumes the session. A closed progress
    /// channel does not stop the loop; completion state lives in the
    /// handle, not the channel.
    pub async fn drive(
        &self,
        handle: &mut UploadHandle,
        payload: &[u8],
        progress: &mpsc::Sender<ProgressRecord>,
    ) -> Result<(), TransferError> {
        check_payload(handle, payload)?;

        while let Some(range) = handle.next_chunk_range() {
            let offset = range.start as u64;
            let chunk = Chunk::new(handle.tx_id(), offset, &payload[range]);
            self.committer.commit_chunk(&chunk).await?;
            handle.advance();
            let _ = progress.send(handle.progress()).await;
        }
        Ok(())
    }
}

fn check_payload(handle: &UploadHandle, payload: &[u8]) -> Result<(), TransferError> {
    if payload.len() as u64 != handle.data_size() {
        return Err(TransferError::PayloadMismatch {
            expected: handle.data_size(),
            actual: payload.len() as u64,
        });
    }
    Ok(())
}
