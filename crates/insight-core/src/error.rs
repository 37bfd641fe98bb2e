//! Error Types

use thiserror::Error;

/// Result type alias for insight operations
pub type Result<T> = std::result::Result<T, InsightError>;

/// Insight error types
///
/// Only `InvalidInput` ever reaches a caller as an error. Every other variant is
/// logged and converted into a canned record by the pipelines.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Missing or malformed required input (caller error)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider credential is absent
    #[error("Provider not configured: {0}")]
    ProviderUnconfigured(String),

    /// Provider returned an error or the call failed in transit
    #[error("Provider error: {0}")]
    Provider(String),

    /// External call exceeded its time bound
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Provider answered, but not with the expected shape
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Memory store error
    #[error("Memory store error: {0}")]
    Memory(String),

    /// Market data error
    #[error("Market data error: {0}")]
    MarketData(String),

    /// Chain explorer error
    #[error("Chain data error: {0}")]
    ChainData(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightError {
    /// Whether the caller is at fault (maps to a 4xx at the transport edge)
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::ProviderUnconfigured(_) => "This feature is not configured on the server.".into(),
            Self::Provider(_) | Self::Timeout(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::InvalidResponse(_) => "The AI service returned an unreadable answer.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
