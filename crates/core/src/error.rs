/// Result alias that carries the custom [`PulseWaveError`] type.
pub type Result<T> = std::result::Result<T, PulseWaveError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PulseWaveError {
    /// The widget was laid out with something other than exactly one child.
    /// Drawing is undefined in that case, so the widget instance is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A configuration value falls outside its allowed range.
    #[error("invalid `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The configuration document could not be parsed.
    #[error("malformed configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

impl PulseWaveError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
