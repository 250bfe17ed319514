mod config;

use anyhow::{bail, Context, Result};
use cafmal_alert::engine::AlertEvaluator;
use cafmal_alert::summary::RunSummary;
use cafmal_notify::plugin::PluginRegistry;
use cafmal_notify::registry::ChannelRegistry;
use cafmal_store::HttpAlertStore;
use config::AlerterConfig;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

struct Args {
    config_path: Option<String>,
    once: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self {
            config_path: None,
            once: false,
        };
        for arg in args {
            match arg.as_str() {
                "--once" => parsed.once = true,
                flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
                _ if parsed.config_path.is_some() => bail!("unexpected argument: {arg}"),
                _ => parsed.config_path = Some(arg),
            }
        }
        Ok(parsed)
    }
}

/// Logs in with a fresh session, then runs one evaluation for the
/// configured team.
async fn run_once(config: &AlerterConfig, channels: &Arc<ChannelRegistry>) -> Result<RunSummary> {
    let store = HttpAlertStore::login(
        &config.api_url,
        &config.email,
        &config.password,
        config.request_timeout(),
    )
    .await
    .context("login failed")?;

    let evaluator = AlertEvaluator::new(Arc::new(store), channels.clone(), &config.alerter_uuid);
    let summary = evaluator.evaluate(config.team_id).await?;
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        team_id = summary.team_id,
        alerter_id = summary.alerter_id,
        due = summary.due_count(),
        dispatched = summary.dispatched_count(),
        failed = summary.failed_count(),
        "Alert run finished"
    );
    for report in summary.rules.iter().filter(|r| r.outcome.is_failure()) {
        tracing::warn!(
            rule_id = report.rule_id,
            outcome = ?report.outcome,
            "Alert rule failed"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cafmal=info".parse()?))
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = AlerterConfig::load(args.config_path.as_deref())?;
    let channels = Arc::new(PluginRegistry::default().build(&config.channels)?);

    tracing::info!(
        uuid = %config.alerter_uuid,
        team_id = config.team_id,
        api_url = %config.api_url,
        channels = ?channels.methods(),
        "cafmal-alerter starting"
    );

    if args.once {
        let summary = run_once(&config, &channels).await?;
        log_summary(&summary);
        return Ok(());
    }

    let mut tick = interval(config.interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_secs = config.interval_secs, "Starting alert loop");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match run_once(&config, &channels).await {
                    Ok(summary) => log_summary(&summary),
                    Err(e) => tracing::error!(error = %format!("{e:#}"), "Alert run failed"),
                }
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_path_and_once_in_any_order() {
        let args = parse(&["--once", "alerter.toml"]).unwrap();
        assert!(args.once);
        assert_eq!(args.config_path.as_deref(), Some("alerter.toml"));

        let args = parse(&["alerter.toml"]).unwrap();
        assert!(!args.once);
    }

    #[test]
    fn defaults_to_no_path() {
        let args = parse(&[]).unwrap();
        assert!(args.config_path.is_none());
        assert!(!args.once);
    }

    #[test]
    fn rejects_unknown_flags_and_extra_paths() {
        assert!(parse(&["--dry-run"]).is_err());
        assert!(parse(&["a.toml", "b.toml"]).is_err());
    }
}
