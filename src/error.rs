//! Error handling module for the fomod engine
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Only structurally invalid input and API misuse are errors; authoring
//! anomalies are reported as [`Diagnostic`](crate::diagnostics::Diagnostic)s.

use thiserror::Error;

/// Main error type for the fomod engine
#[derive(Error, Debug)]
pub enum FomodError {
    /// IO errors (model files, archive listings)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed declarative model (unknown keyword, empty group, ...)
    #[error("Model error: {0}")]
    Model(String),

    /// The module-level dependencies are not met by the host
    #[error("Module not usable with this setup: {0}")]
    ModuleNotUsable(String),

    /// Selection edits that the group policy forbids
    #[error("Selection error: {0}")]
    Selection(String),

    /// Groups on the current step still need a selection
    #[error("The following group(s) need a selection: {}", groups.join(", "))]
    SelectionRequired { groups: Vec<String> },

    /// Navigation misuse (finishing early, editing a step that is not current)
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, FomodError>;

// Convenient error constructors
impl FomodError {
    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a selection error
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Create a navigation error
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }
}
