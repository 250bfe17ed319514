//! Data-access layer for alerters, alert rules and events.
//!
//! The evaluator only talks to the [`AlertStore`] trait. The production
//! implementation ([`http::HttpAlertStore`]) is a client for the remote
//! monitoring API; [`memory::MemoryAlertStore`] keeps everything in process
//! and is used for tests and dry runs.

pub mod error;
pub mod http;
pub mod memory;


use async_trait::async_trait;
use cafmal_common::types::{AlertRule, Alerter, AlerterUpsert, Event, NewEvent};
use error::Result;

pub use http::HttpAlertStore;
pub use memory::MemoryAlertStore;

/// Remote store holding alerters, alert rules and events.
///
/// Implementations must be `Send + Sync`: evaluation runs for different
/// teams may share one store from separate tasks.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Lists every alerter visible to the authenticated user.
    async fn list_alerters(&self) -> Result<Vec<Alerter>>;

    async fn create_alerter(&self, alerter: &AlerterUpsert) -> Result<Alerter>;

    /// Updates an existing alerter. `alerter.id` must be set.
    async fn update_alerter(&self, alerter: &AlerterUpsert) -> Result<Alerter>;

    async fn list_alerts(&self) -> Result<Vec<AlertRule>>;

    /// Persists the full rule, including its `updated_at` marker.
    async fn update_alert(&self, rule: &AlertRule) -> Result<AlertRule>;

    /// Lists events created between `since_secs` seconds ago and
    /// `window_secs` seconds after that point.
    async fn list_events(&self, since_secs: u64, window_secs: u64) -> Result<Vec<Event>>;

    async fn create_event(&self, event: &NewEvent) -> Result<Event>;
}
