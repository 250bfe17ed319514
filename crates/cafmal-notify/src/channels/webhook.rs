use crate::error::{NotifyError, Result};
use crate::plugin::ChannelPlugin;
use crate::utils::{truncate_string, MAX_BODY_LENGTH};
use crate::AlertChannel;
use async_trait::async_trait;
use cafmal_common::types::Event;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing;

/// Upper bound on delivery attempts accepted from configuration.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

const BASE_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retrying after the zero-based `attempt`, doubling from
/// 100 ms and capped at 30 s.
pub(crate) fn backoff(attempt: u32) -> Duration {
    2u64.checked_pow(attempt)
        .and_then(|factor| factor.checked_mul(BASE_BACKOFF_MS))
        .map(Duration::from_millis)
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

pub struct WebhookChannel {
    client: reqwest::Client,
    max_attempts: u32,
    body_template: Option<String>,
}

impl WebhookChannel {
    pub fn new(timeout: Duration, max_attempts: u32, body_template: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT),
            body_template,
        })
    }

    pub(crate) fn render_body(&self, events: &[Event], source: &str, target: &str) -> Result<String> {
        if let Some(template) = &self.body_template {
            let names = events
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Ok(template
                .replace("{{source}}", source)
                .replace("{{target}}", target)
                .replace("{{count}}", &events.len().to_string())
                .replace("{{names}}", &names)
                .replace("{{events}}", &serde_json::to_string(events)?))
        } else {
            Ok(serde_json::json!({
                "source": source,
                "target": target,
                "count": events.len(),
                "events": events,
            })
            .to_string())
        }
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn dispatch(&self, events: &[Event], source: &str, target: &str) -> Result<String> {
        let url = reqwest::Url::parse(target.trim()).map_err(|e| NotifyError::InvalidTarget {
            target: target.to_string(),
            reason: e.to_string(),
        })?;
        let body = self.render_body(events, source, target)?;

        let mut last_err = None;
        for attempt in 0..self.max_attempts {
            match self
                .client
                .post(url.clone())
                .header("Content-Type", "application/json")
                .body(body.clone())
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    let resp_body = match resp.text().await {
                        Ok(text) => truncate_string(&text, MAX_BODY_LENGTH),
                        Err(e) => format!("[Failed to read response body: {e}]"),
                    };

                    if status.is_success() {
                        return Ok(format!("webhook {target} responded {status}: {resp_body}"));
                    }
                    tracing::warn!(
                        attempt = attempt + 1,
                        status = %status,
                        "Webhook returned non-success status"
                    );
                    last_err = Some(NotifyError::Api {
                        service: target.to_string(),
                        status: status.as_u16(),
                        body: resp_body,
                    });
                }
                Err(e) => {
                    tracing::warn!(attempt = attempt + 1, error = %e, "Webhook send failed");
                    last_err = Some(e.into());
                }
            }
            if attempt + 1 < self.max_attempts {
                tokio::time::sleep(backoff(attempt)).await;
            }
        }

        tracing::error!(url = %target, attempts = self.max_attempts, "Webhook failed after retries");
        Err(last_err.unwrap_or_else(|| NotifyError::InvalidConfig("max_attempts is zero".to_string())))
    }
}

// Plugin

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WebhookConfig {
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    body_template: Option<String>,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

impl WebhookConfig {
    fn parse(config: &Value) -> Result<Self> {
        // An empty TOML table arrives as `{}`; `null` means "use defaults" too.
        let config = if config.is_null() {
            Value::Object(Default::default())
        } else {
            config.clone()
        };
        let cfg: Self = serde_json::from_value(config)
            .map_err(|e| NotifyError::InvalidConfig(format!("webhook: {e}")))?;
        if cfg.timeout_secs == 0 {
            return Err(NotifyError::InvalidConfig(
                "webhook: timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&cfg.max_attempts) {
            return Err(NotifyError::InvalidConfig(format!(
                "webhook: max_attempts must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {}",
                cfg.max_attempts
            )));
        }
        Ok(cfg)
    }
}

pub struct WebhookPlugin;

impl ChannelPlugin for WebhookPlugin {
    fn name(&self) -> &str {
        "webhook"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        WebhookConfig::parse(config).map(|_| ())
    }

    fn create_channel(&self, config: &Value) -> Result<Arc<dyn AlertChannel>> {
        let cfg = WebhookConfig::parse(config)?;
        Ok(Arc::new(WebhookChannel::new(
            Duration::from_secs(cfg.timeout_secs),
            cfg.max_attempts,
            cfg.body_template,
        )?))
    }
}
