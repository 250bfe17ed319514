use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Event kind written by check runners. Only these events can trigger alerts.
pub const EVENT_KIND_CHECK: &str = "check";

/// Event kind written by the alerter itself to record dispatch outcomes.
pub const EVENT_KIND_ALERT: &str = "alert";

/// Event name used when a dispatch attempt failed.
pub const ALERT_FAILED_EVENT_NAME: &str = "alert_failed";

/// Alert severity level, ordered from lowest to highest.
///
/// Labels are matched exactly (`"warning"`, `"critical"`, `"error"`).
///
/// # Examples
///
/// ```
/// use cafmal_common::types::Severity;
///
/// let sev: Severity = "critical".parse().unwrap();
/// assert_eq!(sev, Severity::Critical);
/// assert_eq!(sev.to_string(), "critical");
/// assert!(Severity::Error > Severity::Warning);
/// assert!("Critical".parse::<Severity>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
    Error,
}

impl Severity {
    /// Numeric rank used when comparing against a rule's minimum severity.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Error => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            "error" => Ok(Severity::Error),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Ranks a raw severity label as stored on events and rules.
///
/// Unknown labels rank `0`, below `warning`.
///
/// # Examples
///
/// ```
/// use cafmal_common::types::rank;
///
/// assert_eq!(rank("warning"), 1);
/// assert_eq!(rank("critical"), 2);
/// assert_eq!(rank("error"), 3);
/// assert_eq!(rank("debug"), 0);
/// ```
pub fn rank(label: &str) -> u8 {
    label.parse::<Severity>().map(Severity::rank).unwrap_or(0)
}

/// Heartbeat/identity record of a running alerter worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alerter {
    pub id: i64,
    pub uuid: String,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub heartbeat_received_at: Option<DateTime<Utc>>,
}

/// Fields sent when creating or refreshing an alerter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlerterUpsert {
    /// Present when updating an existing record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub uuid: String,
    pub team_id: i64,
    pub heartbeat_received_at: DateTime<Utc>,
}

/// A configured alert rule.
///
/// `updated_at` doubles as the "last evaluated at" marker: the evaluator
/// advances it after every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: i64,
    pub team_id: i64,
    /// Shell-style glob matched against event names.
    pub pattern: String,
    pub minimum_severity: String,
    pub alert_method: String,
    pub alert_target: String,
    /// Seconds between evaluations.
    pub cooldown: u64,
    pub is_enabled: bool,
    pub is_silenced: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl AlertRule {
    /// True when the rule is enabled, not silenced and not soft-deleted.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && self.is_enabled && !self.is_silenced
    }

    /// Instant at which the rule's cooldown elapses.
    pub fn next_due_at(&self) -> DateTime<Utc> {
        let cooldown = i64::try_from(self.cooldown).unwrap_or(i64::MAX);
        self.updated_at
            .checked_add_signed(Duration::seconds(cooldown))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Name under which dispatch outcomes for this rule are recorded,
    /// `"<alert_method>.<alert_target>"`.
    pub fn outcome_name(&self) -> String {
        format!("{}.{}", self.alert_method, self.alert_target)
    }
}

/// A recorded event, either a check result or an alert outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub team_id: i64,
    pub kind: String,
    pub name: String,
    pub severity: String,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields sent when creating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub team_id: i64,
    pub kind: String,
    pub name: String,
    pub severity: String,
    pub message: String,
}
