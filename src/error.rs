//! Error types for the pricehunt crate.
//!
//! Per-source failures are always recovered at the orchestrator boundary
//! into `failed_sources`; only configuration problems and caller-initiated
//! cancellation surface to the API caller.

use std::fmt;

/// Errors that can surface from a search operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PriceError {
    /// Invalid engine configuration. Fatal at construction, never per-request.
    #[error("config error: {0}")]
    Config(String),

    /// The caller cancelled the search before it completed.
    #[error("search cancelled")]
    Cancelled,
}

/// Convenience type alias for pricehunt results.
pub type Result<T> = std::result::Result<T, PriceError>;

/// Classification of a source adapter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SourceErrorKind {
    /// The source did not respond in time.
    Timeout,
    /// The source detected and refused automated access.
    Blocked,
    /// The source responded but its payload could not be parsed.
    ParseFailure,
    /// The source is down or otherwise unreachable.
    Unavailable,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Blocked => "blocked",
            Self::ParseFailure => "parse failure",
            Self::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

/// A failure reported by a single source adapter.
///
/// Never propagated past the orchestrator: it is logged and converted
/// into a `failed_sources` entry for the owning request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SourceError {
    /// What went wrong.
    pub kind: SourceErrorKind,
    /// Human-readable detail, safe to log.
    pub message: String,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Timeout, message)
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Blocked, message)
    }

    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::ParseFailure, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }
}

/// A failure in the knowledge-store capability (embedding or lookup).
///
/// Recovered inside the insight engine by omitting the affected
/// insight stages; never surfaced to the search caller.
#[derive(Debug, Clone, thiserror::Error)]
#[error("retrieval error: {0}")]
pub struct RetrievalError(pub String);
