use cafmal_common::types::{rank, AlertRule, Event, EVENT_KIND_CHECK};

/// Checks whether `event` satisfies the rule's predicate: at least the
/// rule's minimum severity, a check event, the rule's team, and a name
/// matching the rule's glob pattern.
pub fn matches(rule: &AlertRule, event: &Event) -> bool {
    rank(&event.severity) >= rank(&rule.minimum_severity)
        && event.kind == EVENT_KIND_CHECK
        && event.team_id == rule.team_id
        && name_matches(&rule.pattern, &event.name)
}

/// Returns the events matching `rule`, preserving input order.
pub fn match_events(rule: &AlertRule, events: &[Event]) -> Vec<Event> {
    events
        .iter()
        .filter(|event| matches(rule, event))
        .cloned()
        .collect()
}

/// Shell-style glob match (`*`, `?`, `[...]`).
fn name_matches(pattern: &str, name: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    glob_match::glob_match(pattern, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rule(pattern: &str, minimum_severity: &str) -> AlertRule {
        AlertRule {
            id: 1,
            team_id: 1,
            pattern: pattern.into(),
            minimum_severity: minimum_severity.into(),
            alert_method: "webhook".into(),
            alert_target: "https://hooks.example.com".into(),
            cooldown: 3600,
            is_enabled: true,
            is_silenced: false,
            deleted_at: None,
            updated_at: Utc::now(),
        }
    }

    fn event(id: i64, name: &str, severity: &str) -> Event {
        let now = Utc::now();
        Event {
            id,
            team_id: 1,
            kind: "check".into(),
            name: name.into(),
            severity: severity.into(),
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn ids(events: &[Event]) -> Vec<i64> {
        events.iter().map(|e| e.id).collect()
    }

    #[test]
    fn selects_only_pattern_matches() {
        let events = vec![event(1, "db-01", "error"), event(2, "web-01", "error")];
        let matched = match_events(&rule("db-*", "critical"), &events);
        assert_eq!(ids(&matched), vec![1]);
    }

    #[test]
    fn severity_floor_is_inclusive() {
        let events = vec![
            event(1, "db-01", "warning"),
            event(2, "db-02", "critical"),
            event(3, "db-03", "error"),
            event(4, "db-04", "debug"),
        ];
        assert_eq!(ids(&match_events(&rule("db-*", "critical"), &events)), vec![2, 3]);
        assert_eq!(ids(&match_events(&rule("db-*", "warning"), &events)), vec![1, 2, 3]);
        assert_eq!(ids(&match_events(&rule("db-*", "error"), &events)), vec![3]);
    }

    #[test]
    fn unknown_minimum_severity_admits_every_severity() {
        let events = vec![event(1, "db-01", "debug"), event(2, "db-02", "warning")];
        assert_eq!(ids(&match_events(&rule("db-*", "bogus"), &events)), vec![1, 2]);
    }

    #[test]
    fn ignores_other_kinds_and_teams() {
        let mut alert_outcome = event(1, "db-01", "error");
        alert_outcome.kind = "alert".into();
        let mut other_team = event(2, "db-02", "error");
        other_team.team_id = 2;
        let events = vec![alert_outcome, other_team, event(3, "db-03", "error")];

        assert_eq!(ids(&match_events(&rule("*", "warning"), &events)), vec![3]);
    }

    #[test]
    fn supports_single_char_and_class_wildcards() {
        let events = vec![
            event(1, "db-01", "error"),
            event(2, "db-02", "error"),
            event(3, "db-13", "error"),
        ];
        assert_eq!(ids(&match_events(&rule("db-0?", "warning"), &events)), vec![1, 2]);
        assert_eq!(ids(&match_events(&rule("db-[01]1", "warning"), &events)), vec![1]);
        assert_eq!(ids(&match_events(&rule("db-[!0]*", "warning"), &events)), vec![3]);
    }

    #[test]
    fn non_matching_pattern_yields_empty() {
        let events = vec![event(1, "db-01", "error")];
        assert!(match_events(&rule("cache-*", "warning"), &events).is_empty());
        assert!(match_events(&rule("db-*", "warning"), &[]).is_empty());
    }

    #[test]
    fn preserves_input_order_and_is_deterministic() {
        let events = vec![
            event(5, "db-05", "error"),
            event(2, "db-02", "critical"),
            event(9, "web-09", "error"),
            event(1, "db-01", "error"),
        ];
        let r = rule("db-*", "critical");
        let first = match_events(&r, &events);
        let second = match_events(&r, &events);
        assert_eq!(ids(&first), vec![5, 2, 1]);
        assert_eq!(first, second);
    }
}
