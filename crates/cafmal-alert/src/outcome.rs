use cafmal_common::types::{
    AlertRule, NewEvent, Severity, ALERT_FAILED_EVENT_NAME, EVENT_KIND_ALERT,
};
use cafmal_store::AlertStore;
use std::fmt::Display;

/// Outcome event for a successful dispatch, carrying the rule's minimum
/// severity and the channel's result text.
pub fn success_event(rule: &AlertRule, result: &str) -> NewEvent {
    NewEvent {
        team_id: rule.team_id,
        kind: EVENT_KIND_ALERT.to_string(),
        name: rule.outcome_name(),
        severity: rule.minimum_severity.clone(),
        message: result.to_string(),
    }
}

/// Outcome event for a failed dispatch. Always `error` severity.
pub fn failure_event(rule: &AlertRule, error: &dyn Display) -> NewEvent {
    NewEvent {
        team_id: rule.team_id,
        kind: EVENT_KIND_ALERT.to_string(),
        name: ALERT_FAILED_EVENT_NAME.to_string(),
        severity: Severity::Error.to_string(),
        message: format!(
            "Alert {}.{} failed: {error}",
            rule.alert_method, rule.alert_target
        ),
    }
}

/// Writes an outcome event. Best effort: a failed write is logged and
/// reported as `false`, never retried.
pub async fn record(store: &dyn AlertStore, rule_id: i64, event: &NewEvent) -> bool {
    match store.create_event(event).await {
        Ok(created) => {
            tracing::info!(rule_id, event_id = created.id, name = %created.name, "Created new event");
            true
        }
        Err(e) => {
            tracing::error!(
                rule_id,
                name = %event.name,
                error = %e,
                "Failed to record alert outcome"
            );
            false
        }
    }
}
