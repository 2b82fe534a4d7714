use permaflow_transfer::TransferError;

/// Errors produced by the jobs crate.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("chain query failed: {0}")]
    Query(String),

    #[error("missing tag to rebuild payment: {0}")]
    MissingTags(&'static str),

    #[error("payment post rejected: {0}")]
    Post(String),

    #[error("contract read failed: {0}")]
    Contract(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("message encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
