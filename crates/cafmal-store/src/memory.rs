use crate::error::{Result, StoreError};
use crate::AlertStore;
use async_trait::async_trait;
use cafmal_common::types::{AlertRule, Alerter, AlerterUpsert, Event, NewEvent};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lookbacks are clamped to roughly a century to keep date arithmetic in range.
const MAX_LOOKBACK_SECS: u64 = 100 * 365 * 24 * 3600;

#[derive(Default)]
struct Inner {
    next_id: i64,
    alerters: Vec<Alerter>,
    alerts: Vec<AlertRule>,
    events: Vec<Event>,
    pinned_now: Option<DateTime<Utc>>,
}

impl Inner {
    fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process [`AlertStore`] keeping records in insertion order.
///
/// Ids are assigned from one counter shared by all record types. Events
/// created through the trait are stamped with the store's clock, which is
/// the wall clock unless pinned with [`MemoryAlertStore::pin_clock`]. Event
/// windows are anchored on the same clock.
#[derive(Default)]
pub struct MemoryAlertStore {
    inner: Mutex<Inner>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixes the store's notion of "now" for event windows and timestamps.
    pub fn pin_clock(&self, now: DateTime<Utc>) {
        self.lock().pinned_now = Some(now);
    }

    /// Inserts or replaces a rule, keeping the caller's id.
    pub fn put_alert(&self, rule: AlertRule) {
        let mut inner = self.lock();
        inner.next_id = inner.next_id.max(rule.id);
        match inner.alerts.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => inner.alerts.push(rule),
        }
    }

    /// Inserts an event as-is, keeping its id and timestamps.
    pub fn put_event(&self, event: Event) {
        let mut inner = self.lock();
        inner.next_id = inner.next_id.max(event.id);
        inner.events.push(event);
    }

    pub fn put_alerter(&self, alerter: Alerter) {
        let mut inner = self.lock();
        inner.next_id = inner.next_id.max(alerter.id);
        inner.alerters.push(alerter);
    }

    pub fn alerts(&self) -> Vec<AlertRule> {
        self.lock().alerts.clone()
    }

    pub fn alert(&self, id: i64) -> Option<AlertRule> {
        self.lock().alerts.iter().find(|r| r.id == id).cloned()
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Events of the given kind, in creation order.
    pub fn events_of_kind(&self, kind: &str) -> Vec<Event> {
        self.lock()
            .events
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn alerters(&self) -> Vec<Alerter> {
        self.lock().alerters.clone()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn list_alerters(&self) -> Result<Vec<Alerter>> {
        Ok(self.alerters())
    }

    async fn create_alerter(&self, alerter: &AlerterUpsert) -> Result<Alerter> {
        let mut inner = self.lock();
        let created = Alerter {
            id: inner.next_id(),
            uuid: alerter.uuid.clone(),
            team_id: Some(alerter.team_id),
            heartbeat_received_at: Some(alerter.heartbeat_received_at),
        };
        inner.alerters.push(created.clone());
        Ok(created)
    }

    async fn update_alerter(&self, alerter: &AlerterUpsert) -> Result<Alerter> {
        let id = alerter.id.ok_or_else(|| {
            StoreError::InvalidRequest(format!("alerter {} has no id to update", alerter.uuid))
        })?;
        let mut inner = self.lock();
        let existing = inner
            .alerters
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound {
                entity: "alerter",
                id,
            })?;
        existing.uuid = alerter.uuid.clone();
        existing.team_id = Some(alerter.team_id);
        existing.heartbeat_received_at = Some(alerter.heartbeat_received_at);
        Ok(existing.clone())
    }

    async fn list_alerts(&self) -> Result<Vec<AlertRule>> {
        Ok(self.alerts())
    }

    async fn update_alert(&self, rule: &AlertRule) -> Result<AlertRule> {
        let mut inner = self.lock();
        let existing = inner
            .alerts
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or(StoreError::NotFound {
                entity: "alert",
                id: rule.id,
            })?;
        *existing = rule.clone();
        Ok(existing.clone())
    }

    async fn list_events(&self, since_secs: u64, window_secs: u64) -> Result<Vec<Event>> {
        let inner = self.lock();
        let now = inner.now();
        let from = now - Duration::seconds(since_secs.min(MAX_LOOKBACK_SECS) as i64);
        let to = from + Duration::seconds(window_secs.min(MAX_LOOKBACK_SECS) as i64);

        let events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| e.created_at >= from && e.created_at <= to)
            .cloned()
            .collect();
        Ok(events)
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event> {
        let mut inner = self.lock();
        let now = inner.now();
        let created = Event {
            id: inner.next_id(),
            team_id: event.team_id,
            kind: event.kind.clone(),
            name: event.name.clone(),
            severity: event.severity.clone(),
            message: Some(event.message.clone()),
            created_at: now,
            updated_at: now,
        };
        inner.events.push(created.clone());
        Ok(created)
    }
}
