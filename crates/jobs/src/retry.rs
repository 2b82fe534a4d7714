//! Lost-payment rebuild.
//!
//! When the watcher declares a payment lost, the original transaction's
//! tags still describe what was owed to whom. This module rebuilds the
//! payment from them and posts it through the wallet seam.

use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use tracing::info;

use permaflow_protocol::constants::tag_names;
use permaflow_protocol::messages::WatchTxRequest;
use permaflow_protocol::types::Tag;

use crate::JobError;

/// A replacement payment accepted by the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedPayment {
    pub tx_id: String,
    pub tags: Vec<Tag>,
}

/// Wallet seam that signs and posts a payment transaction.
///
/// Key handling and transport are out of scope.
pub trait TxPoster: Send + Sync {
    /// Posts a payment of `quantity` to `target` carrying `tags`;
    /// returns the new transaction id.
    fn post_payment<'a>(
        &'a self,
        target: &'a str,
        quantity: &'a str,
        tags: Vec<Tag>,
    ) -> Pin<Box<dyn Future<Output = Result<String, JobError>> + Send + 'a>>;
}

/// Rebuilds and posts the payment for `request`'s operation.
///
/// The carried tags provide the payment quantity and target; both must be
/// present. Bookkeeping tags of the failed attempt (payment quantity and
/// target, operation name, signing-client stamps) are dropped, the
/// unix-time tag is refreshed, and the operation's payment name plus
/// reference tag are applied fresh.
pub async fn retry_payment<P: TxPoster + ?Sized>(
    poster: &P,
    request: &WatchTxRequest,
) -> Result<PostedPayment, JobError> {
    let quantity = tag_value(&request.tags, tag_names::PAYMENT_QUANTITY)
        .ok_or(JobError::MissingTags(tag_names::PAYMENT_QUANTITY))?;
    let target = tag_value(&request.tags, tag_names::PAYMENT_TARGET)
        .ok_or(JobError::MissingTags(tag_names::PAYMENT_TARGET))?;

    let mut tags = vec![
        Tag::new(
            tag_names::OPERATION_NAME,
            request.operation.payment_operation(),
        ),
        Tag::new(request.operation.reference_tag(), &request.tx_id),
    ];
    for tag in &request.tags {
        match tag.name.as_str() {
            tag_names::PAYMENT_QUANTITY
            | tag_names::PAYMENT_TARGET
            | tag_names::OPERATION_NAME
            | tag_names::SIGNING_CLIENT
            | tag_names::SIGNING_CLIENT_VERSION => {}
            tag_names::UNIX_TIME => tags.push(Tag::new(
                tag_names::UNIX_TIME,
                Utc::now().timestamp().to_string(),
            )),
            _ => tags.push(tag.clone()),
        }
    }

    let tx_id = poster.post_payment(target, quantity, tags.clone()).await?;
    info!(lost = %request.tx_id, replacement = %tx_id, "payment reposted");
    Ok(PostedPayment { tx_id, tags })
}

fn tag_value<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.name == name)
        .map(|tag| tag.value.as_str())
}
