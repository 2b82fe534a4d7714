use serde::{Deserialize, Serialize};

use crate::types::{OperationKind, Tag};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Starts (or resumes) a chunked upload on the driver context.
///
/// `uploader` is the textual encoding of the resumable session handle;
/// `data` is the full payload originally committed to that session. The
/// `data` field is base64-encoded in JSON so the envelope stays text-safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartUploadRequest {
    pub uploader: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Asks the watcher to track the payment for a marketplace transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchTxRequest {
    pub tx_id: String,
    pub operation: OperationKind,
    pub address: String,
    /// Tags of the watched transaction, carried along so a lost payment
    /// can be rebuilt without re-fetching them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

/// Terminal event for an upload whose chunk commit was rejected.
///
/// Carries the progressed handle so the caller can resume from the last
/// committed chunk without tracking state of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFailedEvent {
    pub error: String,
    pub uploader: String,
}

/// The watched payment was found and confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxConfirmedEvent {
    pub tx_id: String,
}

/// No payment surfaced within the confirmation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxLostEvent {
    pub tx_id: String,
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
