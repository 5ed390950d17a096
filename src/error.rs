use thiserror::Error;

/// Errors raised below the operation layer.
///
/// None of these cross the helper's call boundary: the operation layer turns every
/// `ProbeError` into an error [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A CSS selector could not be parsed
    #[error("'{query}' is not a valid selector")]
    InvalidSelector { query: String, reason: String },

    /// A path query could not be parsed or evaluated
    #[error("'{expr}' is not a valid XPath expression")]
    InvalidXPath { expr: String, reason: String },

    /// The request named an operation the helper does not expose
    #[error("unknown operation \"{0}\"")]
    UnknownOperation(String),

    /// The request arguments had the wrong shape for the operation
    #[error("invalid arguments for {op}: {reason}")]
    InvalidArguments { op: String, reason: String },

    /// The helper has not been injected into the window yet
    #[error("page helper is not installed under window.{0}")]
    NotInstalled(String),

    /// A snippet source has not been registered with the page
    #[error("snippet is not defined: {0}")]
    UndefinedSnippet(String),

    /// A snippet ran and reported a failure
    #[error("{0}")]
    Script(String),

    /// JSON encoding/decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Longer description, including parser detail where there is one
    pub fn detail(&self) -> String {
        match self {
            ProbeError::InvalidSelector { reason, .. } | ProbeError::InvalidXPath { reason, .. } => {
                format!("{} ({})", self, reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for page-probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;
