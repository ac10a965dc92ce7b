use crate::domain::signal::{CompletionSignal, IgnoreReason};
use crate::error::{HandoffError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the handoff state machine.
///
/// Successful transitions only move forward:
/// `Idle -> Starting -> AwaitingCompletion -> ReadyToFinalize -> Finalizing -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Starting,
    AwaitingCompletion,
    ReadyToFinalize,
    Finalizing,
}

impl Phase {
    /// The phase a failed or cancelled operation falls back to.
    pub fn stable(self) -> Self {
        match self {
            Phase::Starting | Phase::AwaitingCompletion => Phase::Idle,
            Phase::Finalizing => Phase::ReadyToFinalize,
            other => other,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Starting => "starting",
            Phase::AwaitingCompletion => "awaiting completion",
            Phase::ReadyToFinalize => "ready to finalize",
            Phase::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Opaque identifier shared by the backend and the provider for one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(HandoffError::MalformedResponse(
                "transaction id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a window opened through a `WindowOpener`.
///
/// Openers hand out a fresh id per `open`, so an id also identifies the session
/// that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionToken(pub u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single in-flight transaction.
///
/// Owns the transaction id, the provider window handle and the completion
/// subscription. A new session replaces the previous one wholesale, so nothing
/// from an earlier session can leak into it.
#[derive(Debug)]
pub struct Session {
    token: SessionToken,
    transaction_id: Option<TransactionId>,
    window: Option<WindowId>,
    expected_origin: Option<String>,
    subscribed: bool,
}

impl Session {
    pub fn new(token: SessionToken) -> Self {
        Self {
            token,
            transaction_id: None,
            window: None,
            expected_origin: None,
            subscribed: false,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub fn expected_origin(&self) -> Option<&str> {
        self.expected_origin.as_deref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn record_transaction(&mut self, transaction_id: TransactionId) {
        self.transaction_id = Some(transaction_id);
    }

    /// Records the opened provider window and registers the one completion
    /// subscription of this session.
    pub fn attach_window(&mut self, window: WindowId, expected_origin: String) {
        self.window = Some(window);
        self.expected_origin = Some(expected_origin);
        self.subscribed = true;
    }

    /// Checks a signal against the subscription. Only a signal sent by this
    /// session's window from the expected origin counts as completion.
    pub fn check_signal(&self, signal: &CompletionSignal) -> std::result::Result<(), IgnoreReason> {
        if !self.subscribed {
            return Err(IgnoreReason::NotSubscribed);
        }
        if self.expected_origin.as_deref() != Some(signal.origin.as_str()) {
            return Err(IgnoreReason::UnexpectedOrigin(signal.origin.clone()));
        }
        if signal.source.is_none() || signal.source != self.window {
            return Err(IgnoreReason::UnexpectedSource(signal.source));
        }
        Ok(())
    }

    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    /// Hands out the window handle at most once; later calls return `None`.
    pub fn take_window(&mut self) -> Option<WindowId> {
        self.window.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn signal(origin: &str, source: Option<u64>) -> CompletionSignal {
        CompletionSignal {
            origin: origin.to_string(),
            source: source.map(WindowId),
            data: Value::Null,
        }
    }

    #[test]
    fn test_empty_transaction_id_rejected() {
        assert!(TransactionId::new("").is_err());
        assert!(TransactionId::new("   ").is_err());
        assert_eq!(TransactionId::new("T1").unwrap().as_str(), "T1");
    }

    #[test]
    fn test_stable_phase() {
        assert_eq!(Phase::Starting.stable(), Phase::Idle);
        assert_eq!(Phase::AwaitingCompletion.stable(), Phase::Idle);
        assert_eq!(Phase::Finalizing.stable(), Phase::ReadyToFinalize);
        assert_eq!(Phase::ReadyToFinalize.stable(), Phase::ReadyToFinalize);
        assert_eq!(Phase::Idle.stable(), Phase::Idle);
    }

    #[test]
    fn test_signal_before_subscription_ignored() {
        let session = Session::new(SessionToken(1));
        assert_eq!(
            session.check_signal(&signal("https://pay.example", Some(1))),
            Err(IgnoreReason::NotSubscribed)
        );
    }

    #[test]
    fn test_signal_filtering() {
        let mut session = Session::new(SessionToken(1));
        session.attach_window(WindowId(7), "https://pay.example".to_string());

        assert!(session.check_signal(&signal("https://pay.example", Some(7))).is_ok());
        assert_eq!(
            session.check_signal(&signal("https://evil.example", Some(7))),
            Err(IgnoreReason::UnexpectedOrigin("https://evil.example".to_string()))
        );
        assert_eq!(
            session.check_signal(&signal("https://pay.example", Some(8))),
            Err(IgnoreReason::UnexpectedSource(Some(WindowId(8))))
        );
        assert_eq!(
            session.check_signal(&signal("https://pay.example", None)),
            Err(IgnoreReason::UnexpectedSource(None))
        );

        session.unsubscribe();
        assert_eq!(
            session.check_signal(&signal("https://pay.example", Some(7))),
            Err(IgnoreReason::NotSubscribed)
        );
    }

    #[test]
    fn test_window_taken_once() {
        let mut session = Session::new(SessionToken(1));
        session.attach_window(WindowId(3), "https://pay.example".to_string());

        assert_eq!(session.take_window(), Some(WindowId(3)));
        assert_eq!(session.take_window(), None);
    }
}
