//! Vouch contract seam.
//!
//! Operator addresses are gated on being vouched for in a smart contract.
//! Contract evaluation happens in an external client; this module only
//! defines the read seam and the membership check.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::JobError;

/// Contract state relevant to the marketplace: the vouched-address set.
///
/// Values carry per-address vouch metadata the marketplace does not
/// interpret; membership is all that matters here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VouchState {
    #[serde(default)]
    pub vouched: HashMap<String, serde_json::Value>,
}

/// Client evaluating the vouch contract's current state.
pub trait ContractReader: Send + Sync {
    fn read_state(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<VouchState, JobError>> + Send + '_>>;
}

/// Whether `address` has been vouched for.
pub async fn is_vouched<R: ContractReader + ?Sized>(
    reader: &R,
    address: &str,
) -> Result<bool, JobError> {
    let state = reader.read_state().await?;
    Ok(state.vouched.contains_key(address))
}
