use crate::error::{NotifyError, Result};
use crate::registry::ChannelRegistry;
use crate::AlertChannel;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Factory for creating [`AlertChannel`] instances from JSON configuration.
///
/// Each plugin is registered in the [`PluginRegistry`] by its `name()`,
/// which is also the `alert_method` rules use to select the channel.
pub trait ChannelPlugin: Send + Sync {
    /// Returns the plugin type name (e.g., `"webhook"`).
    fn name(&self) -> &str;

    /// Validates a JSON config blob against this plugin's expected schema.
    fn validate_config(&self, config: &Value) -> Result<()>;

    /// Creates a configured channel instance from a validated JSON config.
    fn create_channel(&self, config: &Value) -> Result<Arc<dyn AlertChannel>>;
}

/// Registry of available [`ChannelPlugin`]s, used to instantiate
/// channels from configuration at startup.
///
/// # Examples
///
/// ```
/// use cafmal_notify::plugin::PluginRegistry;
///
/// let plugins = PluginRegistry::default();
/// assert!(plugins.has_plugin("webhook"));
/// assert!(!plugins.has_plugin("Webhook"));
/// ```
pub struct PluginRegistry {
    plugins: HashMap<String, Box<dyn ChannelPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn ChannelPlugin>) {
        let name = plugin.name().to_string();
        self.plugins.insert(name, plugin);
    }

    pub fn create_channel(&self, type_name: &str, config: &Value) -> Result<Arc<dyn AlertChannel>> {
        let plugin = self
            .plugins
            .get(type_name)
            .ok_or_else(|| NotifyError::UnknownChannelType(type_name.to_string()))?;
        plugin.validate_config(config)?;
        plugin.create_channel(config)
    }

    pub fn get_plugin(&self, type_name: &str) -> Option<&dyn ChannelPlugin> {
        self.plugins.get(type_name).map(|p| p.as_ref())
    }

    pub fn has_plugin(&self, type_name: &str) -> bool {
        self.plugins.contains_key(type_name)
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates one channel per configured method.
    ///
    /// Fails on the first method without a matching plugin or with an
    /// invalid config, so misconfiguration surfaces before any run.
    pub fn build(&self, configs: &BTreeMap<String, Value>) -> Result<ChannelRegistry> {
        let mut registry = ChannelRegistry::new();
        for (method, config) in configs {
            let channel = self.create_channel(method, config)?;
            registry.register(method, channel);
        }
        Ok(registry)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::channels::webhook::WebhookPlugin));
        registry
    }
}
