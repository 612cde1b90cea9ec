//! Error types for CurioCrawl
//!
//! This module provides the error type hierarchy using `thiserror`
//! for proper error handling across all components.

use thiserror::Error;

/// The main error type for CurioCrawl operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser session lifecycle errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// A primitive action (click/fill) against a page element failed.
    ///
    /// Never fatal to an exploration run: the loop records it and moves on.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Report rendering errors
    #[error("Report error: {0}")]
    Report(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Session could not be created or the initial navigation failed
    #[error("Failed to initialize browse session: {0}")]
    InitFailed(String),

    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    /// Timeout waiting for browser
    #[error("Browser operation timed out after {0}ms")]
    Timeout(u64),
}

/// A click or fill against a concrete selector failed
#[derive(Error, Debug)]
#[error("Action failed on `{selector}`: {message}")]
pub struct ActionError {
    /// Selector the action targeted
    pub selector: String,
    /// Provider-reported failure message
    pub message: String,
}

impl ActionError {
    /// Create an action error for a selector
    pub fn new<S: Into<String>, M: Into<String>>(selector: S, message: M) -> Self {
        Self {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CurioCrawl operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a report error from a string
    pub fn report<S: Into<String>>(msg: S) -> Self {
        Error::Report(msg.into())
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Browser(BrowserError::InitFailed("no chrome".to_string()));
        assert!(err.to_string().contains("Failed to initialize"));
        assert!(err.to_string().contains("no chrome"));
    }

    #[test]
    fn test_action_error() {
        let err = ActionError::new("#submit", "node detached");
        assert_eq!(err.to_string(), "Action failed on `#submit`: node detached");
    }

    #[test]
    fn test_action_error_is_transparent() {
        let err: Error = ActionError::new("button.buy", "timeout").into();
        assert!(err.to_string().contains("button.buy"));
        assert!(!err.to_string().contains("Browser error"));
    }

    #[test]
    fn test_generic_error() {
        let err = Error::generic("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }
}
