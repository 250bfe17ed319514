use cafmal_store::error::StoreError;

/// Failures that abort a whole evaluation run.
///
/// Per-rule failures never surface here; they are reported through
/// [`crate::summary::RuleOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Alert: failed to register alerter heartbeat: {0}")]
    Heartbeat(#[source] StoreError),

    #[error("Alert: failed to list alert rules: {0}")]
    FetchRules(#[source] StoreError),
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
