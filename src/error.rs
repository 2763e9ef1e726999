// src/error.rs
// Error taxonomy for the search service.
//
// Only `Validation` and `DependencyUnready` are ever surfaced to callers as
// non-2xx HTTP responses; every other variant is caught at the orchestrator
// boundary and replaced with a documented fallback (see SPEC_FULL.md §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("dependency not ready: {0}")]
    DependencyUnready(String),

    #[error("dependency call failed: {0}")]
    DependencyTransient(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn dependency_unready(msg: impl Into<String>) -> Self {
        Self::DependencyUnready(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::DependencyTransient(msg.into())
    }

    /// Whether this error should be surfaced to the HTTP caller, vs.
    /// degraded-and-logged by the orchestrator.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::DependencyUnready(_))
    }
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        Self::DependencyTransient(format!("store error: {e}"))
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::DependencyTransient(format!("http client error: {e}"))
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;

/// Extension trait mirroring the teacher's `IntoGitErrorResult`: attach
/// context to any error type while converting into `SearchError`.
pub trait IntoSearchErrorResult<T> {
    fn context_err(self, context: &str) -> SearchResult<T>;
}

impl<T, E: std::fmt::Display> IntoSearchErrorResult<T> for Result<T, E> {
    fn context_err(self, context: &str) -> SearchResult<T> {
        self.map_err(|e| SearchError::Internal(format!("{context}: {e}")))
    }
}
