//! Background jobs for the marketplace client.
//!
//! Everything here runs off the embedding UI's thread: the upload driver
//! ([`upload::submit`]), the payment confirmation watcher
//! ([`confirm::watch`] and [`manager::JobManager`]), the lost-payment
//! rebuild ([`retry::retry_payment`]), and the thin vouch contract seam
//! ([`vouch`]). Consumers observe everything through bounded channels and
//! plain state objects; no shared mutable memory crosses the boundary.

pub mod confirm;
mod error;
pub mod manager;
pub mod retry;
pub mod state;
pub mod upload;
pub mod vouch;

pub use error::JobError;
