use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/alerter.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Config: {0}")]
    Invalid(String),
}

/// File layout; every field may also come from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    api_url: Option<String>,
    alerter_uuid: Option<String>,
    team_id: Option<i64>,
    email: Option<String>,
    password: Option<String>,
    #[serde(default = "default_interval_secs")]
    interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default)]
    channels: BTreeMap<String, Value>,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

pub struct AlerterConfig {
    pub api_url: String,
    pub alerter_uuid: String,
    pub team_id: i64,
    pub email: String,
    pub password: String,
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Channel configuration keyed by alert method.
    pub channels: BTreeMap<String, Value>,
}

impl fmt::Debug for AlerterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlerterConfig")
            .field("api_url", &self.api_url)
            .field("alerter_uuid", &self.alerter_uuid)
            .field("team_id", &self.team_id)
            .field("email", &self.email)
            .field("password", &"***")
            .field("interval_secs", &self.interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AlerterConfig {
    /// Loads the file at `path` (or the default path) and applies
    /// `CAFMAL_*` environment overrides.
    ///
    /// A missing file is tolerated only when no path was given.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    pub(crate) fn load_with_env(
        path: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw = match path {
            Some(p) => read_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => read_file(DEFAULT_CONFIG_PATH)?,
            None => RawConfig::default_values(),
        };
        Self::resolve(raw, env)
    }

    fn resolve(
        mut raw: RawConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("CAFMAL_API_URL") {
            raw.api_url = Some(v);
        }
        if let Some(v) = var("CAFMAL_ALERTER_UUID") {
            raw.alerter_uuid = Some(v);
        }
        if let Some(v) = var("CAFMAL_ALERTER_TEAM_ID") {
            let team_id = v.trim().parse::<i64>().map_err(|_| {
                ConfigError::Invalid(format!("CAFMAL_ALERTER_TEAM_ID must be an integer, got '{v}'"))
            })?;
            raw.team_id = Some(team_id);
        }
        if let Some(v) = var("CAFMAL_ALERTER_EMAIL") {
            raw.email = Some(v);
        }
        if let Some(v) = var("CAFMAL_ALERTER_PASSWORD") {
            raw.password = Some(v);
        }
        if let Some(v) = var("CAFMAL_ALERTER_INTERVAL_SECS") {
            raw.interval_secs = v.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "CAFMAL_ALERTER_INTERVAL_SECS must be an integer, got '{v}'"
                ))
            })?;
        }

        let mut missing = Vec::new();
        let api_url = take(raw.api_url, "api_url", &mut missing);
        let alerter_uuid = take(raw.alerter_uuid, "alerter_uuid", &mut missing);
        if raw.team_id.is_none() {
            missing.push("team_id".to_string());
        }
        let email = take(raw.email, "email", &mut missing);
        let password = take(raw.password, "password", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::MissingFields(missing));
        }

        if raw.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be at least 1".to_string()));
        }
        if raw.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        if raw.channels.is_empty() {
            raw.channels
                .insert("webhook".to_string(), Value::Object(Default::default()));
        }

        Ok(Self {
            api_url,
            alerter_uuid,
            team_id: raw.team_id.unwrap_or_default(),
            email,
            password,
            interval_secs: raw.interval_secs,
            request_timeout_secs: raw.request_timeout_secs,
            channels: raw.channels,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RawConfig {
    fn default_values() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            ..Default::default()
        }
    }
}

fn take(value: Option<String>, name: &str, missing: &mut Vec<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name.to_string());
            String::new()
        }
    }
}

fn read_file(path: &str) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const FULL: &str = r#"
api_url = "https://api.example.com"
alerter_uuid = "a-1"
team_id = 7
email = "ops@example.com"
password = "secret"
interval_secs = 15

[channels.webhook]
max_attempts = 5
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_file_with_defaults() {
        let file = write_config(FULL);
        let cfg =
            AlerterConfig::load_with_env(file.path().to_str(), env_from(&[])).unwrap();
        assert_eq!(cfg.api_url, "https://api.example.com");
        assert_eq!(cfg.team_id, 7);
        assert_eq!(cfg.interval_secs, 15);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.channels["webhook"]["max_attempts"], 5);
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config(FULL);
        let env = env_from(&[
            ("CAFMAL_API_URL", "http://localhost:8080"),
            ("CAFMAL_ALERTER_TEAM_ID", "9"),
            ("CAFMAL_ALERTER_PASSWORD", "rotated"),
        ]);
        let cfg = AlerterConfig::load_with_env(file.path().to_str(), env).unwrap();
        assert_eq!(cfg.api_url, "http://localhost:8080");
        assert_eq!(cfg.team_id, 9);
        assert_eq!(cfg.password, "rotated");
        assert_eq!(cfg.email, "ops@example.com");
    }

    #[test]
    fn environment_alone_is_enough() {
        let env = env_from(&[
            ("CAFMAL_API_URL", "http://localhost:8080"),
            ("CAFMAL_ALERTER_UUID", "a-2"),
            ("CAFMAL_ALERTER_TEAM_ID", "1"),
            ("CAFMAL_ALERTER_EMAIL", "a@b.c"),
            ("CAFMAL_ALERTER_PASSWORD", "p"),
        ]);
        let cfg = AlerterConfig::resolve(RawConfig::default_values(), env).unwrap();
        assert_eq!(cfg.interval(), Duration::from_secs(30));
        assert_eq!(cfg.channels.keys().collect::<Vec<_>>(), vec!["webhook"]);
    }

    #[test]
    fn reports_every_missing_field_at_once() {
        let env = env_from(&[("CAFMAL_ALERTER_UUID", "a-2"), ("CAFMAL_ALERTER_EMAIL", "")]);
        let err = AlerterConfig::resolve(RawConfig::default_values(), env)
            .err()
            .expect("config is incomplete");
        match &err {
            ConfigError::MissingFields(fields) => {
                assert_eq!(fields, &["api_url", "team_id", "email", "password"]);
            }
            other => panic!("expected missing fields, got {other}"),
        }
        assert_eq!(
            err.to_string(),
            "Missing required configuration: api_url, team_id, email, password"
        );
    }

    #[test]
    fn non_integer_team_id_is_invalid() {
        let file = write_config(FULL);
        let env = env_from(&[("CAFMAL_ALERTER_TEAM_ID", "ops")]);
        let err = AlerterConfig::load_with_env(file.path().to_str(), env)
            .err()
            .expect("team id is not a number");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = AlerterConfig::load_with_env(path.to_str(), env_from(&[]))
            .err()
            .expect("file does not exist");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("api_urll = \"typo\"\n");
        let err = AlerterConfig::load_with_env(file.path().to_str(), env_from(&[]))
            .err()
            .expect("typo should be caught");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let file = write_config(&FULL.replace("interval_secs = 15", "interval_secs = 0"));
        let err = AlerterConfig::load_with_env(file.path().to_str(), env_from(&[]))
            .err()
            .expect("interval must be positive");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn debug_hides_password() {
        let file = write_config(FULL);
        let cfg = AlerterConfig::load_with_env(file.path().to_str(), env_from(&[])).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("a-1"));
    }
}
