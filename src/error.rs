use crate::domain::session::Phase;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned {status} for {endpoint}")]
    Backend { endpoint: String, status: u16 },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("Cannot {operation} while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },
    #[error("No transaction id recorded for this session")]
    MissingTransactionId,
    #[error("Window error: {0}")]
    Window(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandoffError {
    /// Failures of an awaited external operation. These roll the session back
    /// to its last stable phase instead of leaving it stranded.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Backend { .. } | Self::MalformedResponse(_) | Self::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HandoffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let timeout = HandoffError::Timeout {
            operation: "GET /url",
            after: Duration::from_secs(1),
        };
        assert!(timeout.is_transport());
        assert!(HandoffError::MalformedResponse("missing txid".into()).is_transport());
        assert!(!HandoffError::MissingTransactionId.is_transport());
        assert!(
            !HandoffError::InvalidState {
                operation: "start",
                phase: Phase::Finalizing,
            }
            .is_transport()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = HandoffError::Backend {
            endpoint: "/send".into(),
            status: 502,
        };
        assert_eq!(err.to_string(), "Backend returned 502 for /send");

        let err = HandoffError::InvalidState {
            operation: "finalize",
            phase: Phase::AwaitingCompletion,
        };
        assert_eq!(err.to_string(), "Cannot finalize while awaiting completion");
    }
}
