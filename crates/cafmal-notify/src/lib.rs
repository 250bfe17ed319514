//! Notification dispatch with pluggable channel support.
//!
//! An alert rule names its channel through `alert_method`. The
//! [`registry::ChannelRegistry`] resolves that name to an [`AlertChannel`],
//! which receives the matched events and the rule's `alert_target`.
//! Channels are instantiated from configuration by
//! [`plugin::ChannelPlugin`] factories; the built-in channel is `webhook`.

pub mod channels;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod utils;


use async_trait::async_trait;
use cafmal_common::types::Event;
use error::{NotifyError, Result};

/// A notification channel delivering matched events to a destination
/// (e.g., a webhook URL).
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Returns the method name this channel serves (e.g., `"webhook"`).
    fn name(&self) -> &str;

    /// Delivers `events` to `target` on behalf of `source` and returns a
    /// short description of the delivery, recorded as the outcome message.
    ///
    /// The default implementation fails with [`NotifyError::NotImplemented`],
    /// so a channel that never provides delivery cannot report success.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails after retries (if applicable).
    async fn dispatch(&self, _events: &[Event], _source: &str, _target: &str) -> Result<String> {
        Err(NotifyError::NotImplemented(self.name().to_string()))
    }
}
