//! Unified error handling system
//!
//! Every failure in the analysis pipeline is a tagged [`RateError`]. Callers get a stable
//! [`ErrorKind`] plus a short fixed message; upstream payloads only ever reach the logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type RateResult<T> = Result<T, RateError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Stable error classification exposed to callers of the analysis contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidReference,
    RepoNotFound,
    AuthRequired,
    InvalidToken,
    RateLimited,
    FetchFailed,
    NotATargetApp,
    AmbiguousRoot,
    TreeTruncated,
    UpstreamUnexpected,
    Config,
    Storage,
}

impl ErrorKind {
    /// Short human-readable message shown to end users
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidReference => "Invalid GitHub URL",
            ErrorKind::RepoNotFound => "Repository not found",
            ErrorKind::AuthRequired => "Repository is private. Please provide a GitHub token",
            ErrorKind::InvalidToken => "Invalid GitHub token",
            ErrorKind::RateLimited => "GitHub rate limit exceeded. Please try again later",
            ErrorKind::FetchFailed => "Failed to fetch repository contents",
            ErrorKind::NotATargetApp => "No Next.js app found in this repository",
            ErrorKind::AmbiguousRoot => {
                "Multiple Next.js apps found. Please link to the app directory"
            }
            ErrorKind::TreeTruncated => "Repository is too large to analyze",
            ErrorKind::UpstreamUnexpected => "Failed to analyze repository",
            ErrorKind::Config => "Invalid configuration",
            ErrorKind::Storage => "Failed to access stored results",
        }
    }
}

/// Main error type for the analysis engine
#[derive(Error, Debug, Clone)]
pub enum RateError {
    #[error("Invalid repository reference: {input}")]
    InvalidReference { input: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepoNotFound { owner: String, repo: String },

    #[error("Repository {owner}/{repo} requires authentication")]
    AuthRequired { owner: String, repo: String },

    #[error("Access token was rejected by the hosting API")]
    InvalidToken,

    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Failed to fetch tree for {owner}/{repo}: HTTP {status}")]
    FetchFailed {
        owner: String,
        repo: String,
        status: u16,
    },

    #[error("No Next.js config found in {scope}")]
    NotATargetApp { scope: String },

    #[error("Found {} Next.js configs: {}", candidates.len(), candidates.join(", "))]
    AmbiguousRoot { candidates: Vec<String> },

    #[error("Tree listing for {owner}/{repo} was truncated")]
    TreeTruncated { owner: String, repo: String },

    #[error("Upstream error: {message}")]
    UpstreamUnexpected {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: ErrorContext,
    },
}

impl RateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RateError::InvalidReference { .. } => ErrorKind::InvalidReference,
            RateError::RepoNotFound { .. } => ErrorKind::RepoNotFound,
            RateError::AuthRequired { .. } => ErrorKind::AuthRequired,
            RateError::InvalidToken => ErrorKind::InvalidToken,
            RateError::RateLimited { .. } => ErrorKind::RateLimited,
            RateError::FetchFailed { .. } => ErrorKind::FetchFailed,
            RateError::NotATargetApp { .. } => ErrorKind::NotATargetApp,
            RateError::AmbiguousRoot { .. } => ErrorKind::AmbiguousRoot,
            RateError::TreeTruncated { .. } => ErrorKind::TreeTruncated,
            RateError::UpstreamUnexpected { .. } => ErrorKind::UpstreamUnexpected,
            RateError::Storage { .. } => ErrorKind::Storage,
            RateError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            RateError::UpstreamUnexpected { context, .. } => Some(context),
            RateError::Storage { context, .. } => Some(context),
            RateError::Config { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }

    /// Check if retrying the same request later could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RateError::RateLimited { .. }
                | RateError::UpstreamUnexpected { .. }
                | RateError::Storage { .. }
        )
    }

    /// Storage failures are reported as upstream failures on the analysis path
    pub fn into_analysis_error(self) -> Self {
        match self {
            RateError::Storage { message, context } => {
                RateError::UpstreamUnexpected { message, context }
            }
            other => other,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self.kind() {
            ErrorKind::UpstreamUnexpected | ErrorKind::Storage | ErrorKind::Config => {
                error!(error_id = ?error_id, kind = ?self.kind(), error = %self, "Analysis failed");
            }
            ErrorKind::RateLimited | ErrorKind::FetchFailed => {
                warn!(
                    error_id = ?error_id,
                    kind = ?self.kind(),
                    error = %self,
                    "Upstream request failed (may be recoverable)"
                );
            }
            _ => {
                warn!(kind = ?self.kind(), error = %self, "Analysis rejected");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! upstream_error {
    ($msg:expr, $component:expr, $operation:expr) => {
        $crate::RateError::UpstreamUnexpected {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component).with_operation($operation),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr, $operation:expr) => {
        $crate::RateError::Storage {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component).with_operation($operation),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::RateError::Config {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'ratemynext config --init' to create default config"),
        }
    };
}
