/// Errors returned by [`crate::AlertStore`] implementations.
///
/// # Examples
///
/// ```rust
/// use cafmal_store::error::StoreError;
///
/// let err = StoreError::NotFound {
///     entity: "alert",
///     id: 42,
/// };
/// assert!(err.to_string().contains("alert"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Login was rejected or the token is no longer accepted.
    #[error("Store: authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-success status.
    #[error("Store: API error from {endpoint}: status={status}, body={body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Transport-level failure from `reqwest`.
    #[error("Store: network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Store: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: i64 },

    /// A request could not be built from the given arguments.
    #[error("Store: invalid request: {0}")]
    InvalidRequest(String),
}

/// Convenience `Result` alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
