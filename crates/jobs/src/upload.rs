//! Upload driver task and its consumer subscription.
//!
//! Two execution contexts cooperate around an upload: [`submit`] runs on
//! the consumer's context, packages the session handle and payload into a
//! start message, and spawns the driver task; the driver owns the session
//! for the duration of the upload and reports one event per committed
//! chunk, in commit order, over a bounded channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use permaflow_protocol::constants::MessageType;
use permaflow_protocol::envelope::Message;
use permaflow_protocol::messages::{StartUploadRequest, UploadFailedEvent};
use permaflow_protocol::types::ProgressRecord;
use permaflow_transfer::{ChunkCommitter, UploadHandle, Uploader};

use crate::JobError;

/// Events buffered per upload before the driver starts back-pressuring.
const EVENT_BUFFER: usize = 256;

/// Event delivered to the consumer for an active upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// One chunk committed; carries the post-commit snapshot.
    Progress(ProgressRecord),
    /// Terminal: the upload stopped before completion. Carries the
    /// progressed handle encoding so the caller can resubmit it.
    Failed(UploadFailedEvent),
}

/// Consumer's end of an upload.
///
/// Dropping the subscription does not stop the driver — the session keeps
/// committing and its state survives in the handle. Call
/// [`cancel`](Self::cancel) to terminate the driver context; the
/// network-side session stays resumable at its last committed chunk.
pub struct UploadSubscription {
    id: String,
    events: mpsc::Receiver<UploadEvent>,
    cancel: CancellationToken,
}

impl UploadSubscription {
    /// Receives the next event; `None` once the driver context is gone.
    pub async fn recv(&mut self) -> Option<UploadEvent> {
        self.events.recv().await
    }

    /// Message id of the start request.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Terminates the driver context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Dispatches an upload to a fresh driver context.
///
/// The handle is serialized at this boundary; the driver reconstructs it
/// against the network, so consumer and driver never share mutable state.
pub fn submit<C>(
    committer: Arc<C>,
    handle: &UploadHandle,
    payload: &[u8],
) -> Result<UploadSubscription, JobError>
where
    C: ChunkCommitter + Send + Sync + 'static,
{
    submit_serialized(committer, handle.to_json()?, payload)
}

/// [`submit`] for a handle already in textual form — the resumption path,
/// fed directly from a prior [`UploadFailedEvent::uploader`].
pub fn submit_serialized<C>(
    committer: Arc<C>,
    uploader: String,
    payload: &[u8],
) -> Result<UploadSubscription, JobError>
where
    C: ChunkCommitter + Send + Sync + 'static,
{
    let request = StartUploadRequest {
        uploader,
        data: payload.to_vec(),
    };
    let message = Message::new(
        Uuid::new_v4().to_string(),
        MessageType::StartUpload,
        Some(&request),
    )?;

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let cancel = CancellationToken::new();
    let id = message.id.clone();
    tokio::spawn(run_driver(committer, message, events_tx, cancel.clone()));

    Ok(UploadSubscription {
        id,
        events: events_rx,
        cancel,
    })
}

/// Driver context: owns the session until completion, failure, or
/// cancellation.
async fn run_driver<C>(
    committer: Arc<C>,
    message: Message,
    events: mpsc::Sender<UploadEvent>,
    cancel: CancellationToken,
) where
    C: ChunkCommitter + Send + Sync + 'static,
{
    let fail = |error: String, uploader: String| UploadEvent::Failed(UploadFailedEvent {
        error,
        uploader,
    });

    let request: StartUploadRequest = match message.parse_payload() {
        Ok(Some(request)) => request,
        Ok(None) => {
            let _ = events
                .send(fail("start request has no payload".into(), String::new()))
                .await;
            return;
        }
        Err(e) => {
            let _ = events.send(fail(e.to_string(), String::new())).await;
            return;
        }
    };

    let uploader = Uploader::new(committer);
    let mut handle = match uploader.get_uploader(&request.uploader, &request.data) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(id = %message.id, error = %e, "upload rejected before start");
            let _ = events
                .send(fail(e.to_string(), request.uploader.clone()))
                .await;
            return;
        }
    };

    // Pump transfer-level records into consumer events, preserving
    // emission order.
    let (rec_tx, mut rec_rx) = mpsc::channel::<ProgressRecord>(EVENT_BUFFER);
    let pump_events = events.clone();
    let pump = tokio::spawn(async move {
        while let Some(rec) = rec_rx.recv().await {
            if pump_events.send(UploadEvent::Progress(rec)).await.is_err() {
                break;
            }
        }
    });

    let driven = tokio::select! {
        _ = cancel.cancelled() => None,
        result = uploader.drive(&mut handle, &request.data, &rec_tx) => Some(result),
    };
    drop(rec_tx);
    let _ = pump.await;

    match driven {
        None => {
            debug!(id = %message.id, tx = handle.tx_id(), "upload cancelled; session resumable");
        }
        Some(Ok(())) => {
            info!(
                id = %message.id,
                tx = handle.tx_id(),
                chunks = handle.total_chunks(),
                "upload complete"
            );
        }
        Some(Err(e)) => {
            warn!(id = %message.id, tx = handle.tx_id(), error = %e, "upload halted");
            let progressed = handle
                .to_json()
                .unwrap_or_else(|_| request.uploader.clone());
            let _ = events.send(fail(e.to_string(), progressed)).await;
        }
    }
}
