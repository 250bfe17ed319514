/// Errors that can occur within the notification subsystem.
///
/// # Examples
///
/// ```rust
/// use cafmal_notify::error::NotifyError;
///
/// let err = NotifyError::UnknownChannelType("pager".to_string());
/// assert!(err.to_string().contains("pager"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required field or contains an invalid value.
    #[error("Notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// No channel is registered under the requested method name.
    #[error("Notify: unknown channel type '{0}'")]
    UnknownChannelType(String),

    /// The channel has no delivery implementation.
    #[error("Notify: channel '{0}' does not implement dispatch")]
    NotImplemented(String),

    /// The rule's target cannot be used by the channel (e.g., not a URL).
    #[error("Notify: invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// An HTTP request to an external notification endpoint failed.
    #[error("Notify: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notify: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The external endpoint returned a non-success response.
    #[error("Notify: API error from {service}: status={status}, body={body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
