use crate::error::{EvaluationError, Result};
use crate::summary::{RuleOutcome, RuleReport, RunSummary};
use crate::{cooldown, matcher, outcome, registrar};
use cafmal_common::types::{AlertRule, Event};
use cafmal_notify::error::NotifyError;
use cafmal_notify::registry::ChannelRegistry;
use cafmal_store::AlertStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing;

/// Evaluates a team's alert rules against recently recorded events.
///
/// Holds no mutable state between runs. The caller must not start two
/// runs for the same team concurrently: both would see the same rules as
/// due and race on advancing their cooldowns.
pub struct AlertEvaluator {
    store: Arc<dyn AlertStore>,
    channels: Arc<ChannelRegistry>,
    alerter_uuid: String,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<dyn AlertStore>,
        channels: Arc<ChannelRegistry>,
        alerter_uuid: impl Into<String>,
    ) -> Self {
        Self {
            store,
            channels,
            alerter_uuid: alerter_uuid.into(),
        }
    }

    /// Runs one evaluation for `team_id` at the current time.
    pub async fn evaluate(&self, team_id: i64) -> Result<RunSummary> {
        self.evaluate_at(team_id, Utc::now()).await
    }

    /// Runs one evaluation for `team_id`, treating `now` as the current time.
    ///
    /// # Errors
    ///
    /// Fails only when the heartbeat cannot be registered or the rules cannot
    /// be listed. Failures of individual rules are reported in the summary.
    pub async fn evaluate_at(&self, team_id: i64, now: DateTime<Utc>) -> Result<RunSummary> {
        let alerter =
            registrar::register_alerter(self.store.as_ref(), &self.alerter_uuid, team_id, now)
                .await
                .map_err(EvaluationError::Heartbeat)?;

        let due: Vec<AlertRule> = self
            .store
            .list_alerts()
            .await
            .map_err(EvaluationError::FetchRules)?
            .into_iter()
            .filter(|rule| cooldown::is_eligible(rule, team_id, now))
            .collect();

        tracing::info!(
            team_id,
            count = due.len(),
            rule_ids = ?due.iter().map(|r| r.id).collect::<Vec<_>>(),
            "Alerts to run"
        );

        let mut summary = RunSummary::new(alerter.id, team_id, now);
        for rule in due {
            let report = self.evaluate_rule(rule, now).await;
            summary.rules.push(report);
        }
        Ok(summary)
    }

    async fn evaluate_rule(&self, rule: AlertRule, now: DateTime<Utc>) -> RuleReport {
        tracing::info!(
            rule_id = rule.id,
            team_id = rule.team_id,
            severity = %rule.minimum_severity,
            pattern = %rule.pattern,
            method = %rule.alert_method,
            target = %rule.alert_target,
            "Going to run alert"
        );

        // Events recorded since the rule was last evaluated.
        let lookback = cooldown::lookback_secs(&rule, now);
        let rule_outcome = match self.store.list_events(lookback, lookback).await {
            Ok(events) => self.match_and_dispatch(&rule, &events).await,
            Err(e) => {
                tracing::error!(
                    rule_id = rule.id,
                    lookback_secs = lookback,
                    error = %e,
                    "Failed to fetch events for alert"
                );
                RuleOutcome::FetchFailed {
                    error: e.to_string(),
                }
            }
        };

        let outcome_event = match &rule_outcome {
            RuleOutcome::Misconfigured { matched: 0, .. } => None,
            RuleOutcome::Dispatched { result, .. } => Some(outcome::success_event(&rule, result)),
            RuleOutcome::DispatchFailed { error, .. } | RuleOutcome::Misconfigured { error, .. } => {
                Some(outcome::failure_event(&rule, error))
            }
            RuleOutcome::NoMatch | RuleOutcome::FetchFailed { .. } => None,
        };
        let outcome_recorded = match outcome_event {
            Some(event) => Some(outcome::record(self.store.as_ref(), rule.id, &event).await),
            None => None,
        };

        let rule_id = rule.id;
        let cooldown_advanced = self.advance_cooldown(rule, now).await;

        RuleReport {
            rule_id,
            outcome: rule_outcome,
            outcome_recorded,
            cooldown_advanced,
        }
    }

    async fn match_and_dispatch(&self, rule: &AlertRule, events: &[Event]) -> RuleOutcome {
        let matched = matcher::match_events(rule, events);
        if matched.is_empty() {
            if !self.channels.has_method(&rule.alert_method) {
                tracing::warn!(
                    rule_id = rule.id,
                    method = %rule.alert_method,
                    registered = ?self.channels.methods(),
                    "Alert method is not registered"
                );
                return RuleOutcome::Misconfigured {
                    matched: 0,
                    error: NotifyError::UnknownChannelType(rule.alert_method.clone()).to_string(),
                };
            }
            tracing::info!(rule_id = rule.id, candidates = events.len(), "No events matching this alert");
            return RuleOutcome::NoMatch;
        }

        tracing::info!(
            rule_id = rule.id,
            matched = matched.len(),
            "Found matching events, going to alert"
        );

        let count = matched.len();
        match self.dispatch(rule, &matched).await {
            Ok(result) => {
                tracing::info!(rule_id = rule.id, result = %result, "Alert dispatched");
                RuleOutcome::Dispatched {
                    matched: count,
                    result,
                }
            }
            Err(e @ NotifyError::UnknownChannelType(_)) => {
                tracing::error!(
                    rule_id = rule.id,
                    method = %rule.alert_method,
                    target = %rule.alert_target,
                    registered = ?self.channels.methods(),
                    error = %e,
                    "Alert method is not registered"
                );
                RuleOutcome::Misconfigured {
                    matched: count,
                    error: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(
                    rule_id = rule.id,
                    method = %rule.alert_method,
                    target = %rule.alert_target,
                    error = %e,
                    "Alert failed"
                );
                RuleOutcome::DispatchFailed {
                    matched: count,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn dispatch(&self, rule: &AlertRule, matched: &[Event]) -> cafmal_notify::error::Result<String> {
        let channel = self.channels.resolve(&rule.alert_method)?;
        channel
            .dispatch(matched, &self.alerter_uuid, &rule.alert_target)
            .await
    }

    /// Marks the rule as evaluated at `now`, whatever the outcome.
    async fn advance_cooldown(&self, mut rule: AlertRule, now: DateTime<Utc>) -> bool {
        rule.updated_at = now;
        match self.store.update_alert(&rule).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(rule_id = rule.id, error = %e, "Failed to advance alert cooldown");
                false
            }
        }
    }
}
