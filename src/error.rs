//! Error types for the log source and the two views

use thiserror::Error;

/// Errors reported by a `LogSource` implementation
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Log source unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Log server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SourceError {
    /// Whether trying again later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Unavailable(_) => true,
            SourceError::Http(_) => true,
            SourceError::Status { status, .. } => *status >= 500 || *status == 429,
            SourceError::Decode(_) => false,
        }
    }
}

/// Errors surfaced by the paginated request view
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Could not load request log: {0}")]
    TransientFetch(#[source] SourceError),

    #[error("Could not delete request history: {0}")]
    DestructiveOperation(#[source] SourceError),

    #[error("Invariant violated: {0}")]
    InvariantViolation(&'static str),
}

/// Errors surfaced by the tail poller
#[derive(Debug, Error)]
pub enum TailError {
    #[error("Could not fetch console entries: {0}")]
    TransientFetch(#[source] SourceError),

    #[error("Invariant violated: {0}")]
    InvariantViolation(&'static str),
}

/// Marker for a broken internal invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation(pub &'static str);

impl From<Violation> for ViewError {
    fn from(v: Violation) -> Self {
        ViewError::InvariantViolation(v.0)
    }
}

impl From<Violation> for TailError {
    fn from(v: Violation) -> Self {
        TailError::InvariantViolation(v.0)
    }
}

/// Check an internal invariant.
///
/// Debug builds panic so the defect is found early. Release builds log and
/// return a `Violation`, letting the caller bail out before touching state.
pub fn ensure_invariant(cond: bool, what: &'static str) -> Result<(), Violation> {
    debug_assert!(cond, "invariant violated: {}", what);
    if cond {
        Ok(())
    } else {
        tracing::error!(invariant = what, "invariant violated, operation skipped");
        Err(Violation(what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(SourceError::Unavailable("down".to_string()).is_transient());

        assert!(
            SourceError::Status {
                status: 503,
                message: "Service unavailable".to_string()
            }
            .is_transient()
        );

        assert!(
            SourceError::Status {
                status: 429,
                message: "Too many requests".to_string()
            }
            .is_transient()
        );

        assert!(
            !SourceError::Status {
                status: 404,
                message: "Not found".to_string()
            }
            .is_transient()
        );

        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(!SourceError::Decode(decode).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = ViewError::TransientFetch(SourceError::Unavailable("offline".to_string()));
        assert_eq!(err.to_string(), "Could not load request log: Log source unavailable: offline");

        let err = ViewError::DestructiveOperation(SourceError::Status {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(err.to_string(), "Could not delete request history: Log server returned 500: boom");
    }

    #[test]
    fn test_ensure_invariant_holds() {
        assert_eq!(ensure_invariant(true, "always"), Ok(()));
    }

    #[test]
    fn test_violation_conversion() {
        let err: TailError = Violation("cursor regressed").into();
        assert!(matches!(err, TailError::InvariantViolation("cursor regressed")));
    }
}
