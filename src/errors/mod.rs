//! Error taxonomy (C10, spec.md §3 & §7).
//!
//! Every error crossing a component boundary into the state store is a
//! `StructuredError`. This mirrors the teacher's `MnemosyneError` shape
//! (`thiserror`-derived, with a `Result<T>` alias) but carries the richer
//! category/severity/recoverability metadata spec.md requires instead of
//! one variant per failure site.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Auth,
    Validation,
    Config,
    Api,
    Timeout,
    Permission,
    Unavailable,
    Internal,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A structured, categorized error (spec.md §3).
#[derive(Error, Debug, Clone)]
#[error("{code}: {message}")]
pub struct StructuredError {
    pub category: ErrorCategory,
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    #[source]
    pub cause: Option<Box<StructuredError>>,
    pub recoverable: bool,
    pub user_action: Option<String>,
    pub context: Option<HashMap<String, String>>,
    pub timestamp: DateTime<Utc>,
    /// Whether the banner built from this error should auto-expire
    /// (spec.md §7 "AutoHide=true errors").
    pub auto_hide: bool,
}

impl StructuredError {
    fn base(category: ErrorCategory, severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            code: code.to_string(),
            message: message.into(),
            details: None,
            cause: None,
            recoverable: false,
            user_action: None,
            context: None,
            timestamp: Utc::now(),
            auto_hide: false,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::base(ErrorCategory::Validation, Severity::Medium, "VALIDATION", message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::base(ErrorCategory::Config, Severity::High, "CONFIG", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        let mut e = Self::base(ErrorCategory::Timeout, Severity::Medium, "TIMEOUT", message);
        e.recoverable = true;
        e
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::base(ErrorCategory::Auth, Severity::Critical, "AUTH", message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        let mut e = Self::base(ErrorCategory::Network, Severity::Medium, "NETWORK", message);
        e.recoverable = true;
        e
    }

    pub fn api(code: &str, message: impl Into<String>) -> Self {
        let mut e = Self::base(ErrorCategory::Api, Severity::Medium, code, message);
        e.recoverable = matches!(
            code,
            "CONNECTION_REFUSED" | "TIMEOUT" | "SERVICE_UNAVAILABLE" | "RATE_LIMITED" | "SERVER_ERROR"
        );
        e
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::base(ErrorCategory::Internal, Severity::High, "INTERNAL", message)
    }

    pub fn stream(message: impl Into<String>) -> Self {
        let mut e = Self::base(ErrorCategory::Stream, Severity::Low, "STREAM", message);
        e.recoverable = true;
        e
    }

    /// Wraps `self` as the cause of a new error, preserving the chain.
    pub fn wrap(self, code: &str, message: impl Into<String>) -> Self {
        let mut outer = Self::base(self.category, self.severity, code, message);
        outer.cause = Some(Box::new(self));
        outer
    }

    /// The key a consumer error is stored under (spec.md §4.2 "error coverage").
    pub fn coverage_key(&self, operation: &str) -> (ErrorCategory, String, String) {
        (self.category, self.code.clone(), operation.to_string())
    }

    pub fn with_auto_hide(mut self, auto_hide: bool) -> Self {
        self.auto_hide = auto_hide;
        self
    }

    pub fn with_user_action(mut self, action: impl Into<String>) -> Self {
        self.user_action = Some(action.into());
        self
    }
}

impl PartialEq for StructuredError {
    /// Equality is by `(category, code)` (spec.md §4.10).
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.code == other.code
    }
}

pub type Result<T> = std::result::Result<T, StructuredError>;
