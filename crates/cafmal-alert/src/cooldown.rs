use cafmal_common::types::AlertRule;
use chrono::{DateTime, Utc};

/// True once the rule's cooldown has elapsed since it was last evaluated.
/// A zero cooldown is always due.
pub fn is_due(rule: &AlertRule, now: DateTime<Utc>) -> bool {
    now >= rule.next_due_at()
}

/// Whole seconds since the rule was last evaluated, used both as the
/// "since" and the "window" of the event query. Clamped to zero when
/// `updated_at` lies in the future.
pub fn lookback_secs(rule: &AlertRule, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - rule.updated_at).num_seconds()).unwrap_or(0)
}

/// Whether a rule takes part in a run for `team_id` at `now`.
pub fn is_eligible(rule: &AlertRule, team_id: i64, now: DateTime<Utc>) -> bool {
    rule.team_id == team_id && rule.is_active() && is_due(rule, now)
}
