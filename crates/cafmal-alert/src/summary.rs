use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to one due rule during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// No event satisfied the rule; nothing was dispatched.
    NoMatch,
    /// Matched events were delivered by the rule's channel.
    Dispatched { matched: usize, result: String },
    /// The channel failed to deliver the matched events.
    DispatchFailed { matched: usize, error: String },
    /// The rule names a method with no registered channel. Recorded as an
    /// outcome event only when events matched.
    Misconfigured { matched: usize, error: String },
    /// Candidate events could not be fetched; the rule was not matched.
    FetchFailed { error: String },
}

impl RuleOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RuleOutcome::DispatchFailed { .. }
                | RuleOutcome::Misconfigured { .. }
                | RuleOutcome::FetchFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule_id: i64,
    pub outcome: RuleOutcome,
    /// `Some(false)` when an outcome event should have been written but the
    /// write failed; `None` when no outcome event was due.
    pub outcome_recorded: Option<bool>,
    pub cooldown_advanced: bool,
}

/// Result of one evaluation run for a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub alerter_id: i64,
    pub team_id: i64,
    pub started_at: DateTime<Utc>,
    pub rules: Vec<RuleReport>,
}

impl RunSummary {
    pub fn new(alerter_id: i64, team_id: i64, started_at: DateTime<Utc>) -> Self {
        Self {
            alerter_id,
            team_id,
            started_at,
            rules: Vec::new(),
        }
    }

    pub fn due_count(&self) -> usize {
        self.rules.len()
    }

    pub fn dispatched_count(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| matches!(r.outcome, RuleOutcome::Dispatched { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.rules.iter().filter(|r| r.outcome.is_failure()).count()
    }

    pub fn report(&self, rule_id: i64) -> Option<&RuleReport> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }
}
