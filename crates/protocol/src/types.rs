use serde::{Deserialize, Serialize};

use crate::constants::tag_names;

/// A name/value tag attached to a marketplace transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Marketplace operations whose payment transaction can be watched.
///
/// Serde renames match the `Operation-Name` tag values written by the
/// legacy client, so watch requests interoperate with existing on-chain
/// data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "Model Creation")]
    ModelCreation,
    #[serde(rename = "Operator Registration Save")]
    OperatorRegistrationSave,
    #[serde(rename = "Model Fee Payment Save")]
    ModelFeePaymentSave,
    #[serde(rename = "Script Inference Request")]
    InferenceRequest,
    #[serde(rename = "Script Inference Response")]
    InferenceResponse,
}

impl OperationKind {
    /// `Operation-Name` tag value of the payment expected to reference
    /// a transaction of this kind.
    pub fn payment_operation(&self) -> &'static str {
        match self {
            Self::ModelCreation => "Model Creation Payment",
            Self::OperatorRegistrationSave => "Operator Registration",
            Self::ModelFeePaymentSave => "Model Fee Payment",
            Self::InferenceRequest => "Inference Payment",
            Self::InferenceResponse => "Fee Redistribution",
        }
    }

    /// Name of the tag through which the payment references the watched
    /// transaction.
    pub fn reference_tag(&self) -> &'static str {
        match self {
            Self::ModelCreation => tag_names::MODEL_TRANSACTION,
            Self::OperatorRegistrationSave => tag_names::SAVE_TRANSACTION,
            Self::ModelFeePaymentSave => tag_names::SAVE_TRANSACTION,
            Self::InferenceRequest => tag_names::INFERENCE_TRANSACTION,
            Self::InferenceResponse => tag_names::RESPONSE_TRANSACTION,
        }
    }
}

/// Progress snapshot emitted after each committed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Completion percentage, 0-100, non-decreasing across a session.
    pub pct: u8,
    pub is_complete: bool,
    pub completed_chunks: u32,
    pub total_chunks: u32,
}

impl ProgressRecord {
    /// Builds a record from chunk counts; `pct` is derived as
    /// `round(100 * completed / total)`.
    pub fn new(completed_chunks: u32, total_chunks: u32) -> Self {
        let pct = if total_chunks == 0 {
            100
        } else {
            (f64::from(completed_chunks) * 100.0 / f64::from(total_chunks)).round() as u8
        };
        Self {
            pct,
            is_complete: completed_chunks == total_chunks,
            completed_chunks,
            total_chunks,
        }
    }
}
