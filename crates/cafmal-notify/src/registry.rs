use crate::error::{NotifyError, Result};
use crate::AlertChannel;
use std::collections::HashMap;
use std::sync::Arc;

/// Configured channels keyed by the `alert_method` that selects them.
///
/// Built once at startup and read-only afterwards. Lookups are
/// case-sensitive.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Arc<dyn AlertChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `channel` under `method`, replacing any previous entry.
    pub fn register(&mut self, method: &str, channel: Arc<dyn AlertChannel>) {
        self.channels.insert(method.to_string(), channel);
    }

    /// Resolves a rule's `alert_method` to its channel.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::UnknownChannelType`] when nothing is registered
    /// under `method`.
    pub fn resolve(&self, method: &str) -> Result<&dyn AlertChannel> {
        self.channels
            .get(method)
            .map(|c| c.as_ref())
            .ok_or_else(|| NotifyError::UnknownChannelType(method.to_string()))
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.channels.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.channels.keys().map(|s| s.as_str()).collect();
        methods.sort_unstable();
        methods
    }
}
