use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Blocks the watcher waits for a payment to appear before declaring it lost.
///
/// Counted from the network height at watch start. A payment that has not
/// surfaced within this many blocks is treated as dropped by the network and
/// becomes eligible for a retry post.
pub const MIN_CONFIRMATIONS: u64 = 7;

/// Interval between chain polls while watching for a payment.
pub const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// App identity stamped on every marketplace transaction.
pub const APP_NAME: &str = "Permaflow";
pub const APP_VERSION: &str = "0.1";

/// Tag names used on marketplace transactions.
pub mod tag_names {
    pub const APP_NAME: &str = "App-Name";
    pub const APP_VERSION: &str = "App-Version";
    pub const UNIX_TIME: &str = "Unix-Time";
    pub const OPERATION_NAME: &str = "Operation-Name";
    pub const MODEL_TRANSACTION: &str = "Model-Transaction";
    pub const SAVE_TRANSACTION: &str = "Save-Transaction";
    pub const INFERENCE_TRANSACTION: &str = "Inference-Transaction";
    pub const RESPONSE_TRANSACTION: &str = "Response-Transaction";
    pub const PAYMENT_QUANTITY: &str = "Payment-Quantity";
    pub const PAYMENT_TARGET: &str = "Payment-Target";
    pub const SIGNING_CLIENT: &str = "Signing-Client";
    pub const SIGNING_CLIENT_VERSION: &str = "Signing-Client-Version";
}

/// Message type identifier for driver/consumer messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    // Requests from consumer to driver
    #[serde(rename = "start_upload")]
    StartUpload,
    #[serde(rename = "watch_tx")]
    WatchTx,

    // Events from driver to consumer
    #[serde(rename = "upload_progress")]
    UploadProgress,
    #[serde(rename = "upload_failed")]
    UploadFailed,
    #[serde(rename = "tx_confirmed")]
    TxConfirmed,
    #[serde(rename = "tx_lost")]
    TxLost,

    #[serde(rename = "error")]
    Error,
}
