//! Consumer-side upload state.
//!
//! An explicit value object the embedding UI binds to, instead of state
//! living inside the rendering layer. Applying a record is pure
//! replacement: a duplicate or stale record overwrites the previous
//! snapshot, it is never merged or rejected.

use std::time::{Duration, Instant};

use permaflow_protocol::types::ProgressRecord;

use crate::upload::UploadEvent;

/// View of one upload as last reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadState {
    pub pct: u8,
    pub completed_chunks: u32,
    pub total_chunks: u32,
    pub is_complete: bool,
    /// Set once a terminal failure event arrives.
    pub error: Option<String>,
    updated_at: Instant,
}

impl UploadState {
    pub fn new() -> Self {
        Self {
            pct: 0,
            completed_chunks: 0,
            total_chunks: 0,
            is_complete: false,
            error: None,
            updated_at: Instant::now(),
        }
    }

    /// Replaces the snapshot with `record`.
    pub fn apply(&mut self, record: &ProgressRecord) {
        self.pct = record.pct;
        self.completed_chunks = record.completed_chunks;
        self.total_chunks = record.total_chunks;
        self.is_complete = record.is_complete;
        self.updated_at = Instant::now();
    }

    /// Folds a driver event into the state.
    pub fn apply_event(&mut self, event: &UploadEvent) {
        match event {
            UploadEvent::Progress(record) => self.apply(record),
            UploadEvent::Failed(failed) => {
                self.error = Some(failed.error.clone());
                self.updated_at = Instant::now();
            }
        }
    }

    /// `true` while the upload is neither complete nor failed.
    pub fn in_flight(&self) -> bool {
        !self.is_complete && self.error.is_none()
    }

    /// `true` when an in-flight upload has gone `timeout` without an
    /// event. A stalled upload should be surfaced as failed and offered
    /// for resubmission.
    pub fn stalled(&self, timeout: Duration) -> bool {
        self.in_flight() && self.updated_at.elapsed() >= timeout
    }
}

impl Default for UploadState {
    fn default() -> Self {
        Self::new()
    }
}
