use crate::domain::session::WindowId;
use crate::error::{HandoffError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A cross-window message received by the host.
///
/// The provider posts its SEP-24 transaction record as `data` when the
/// interactive flow is finished. Only the arrival of a signal from the right
/// sender matters; the payload is inspected for logging only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSignal {
    /// Origin of the sender, e.g. `https://pay.example`.
    pub origin: String,
    /// The window that posted the message, when known.
    #[serde(default)]
    pub source: Option<WindowId>,
    #[serde(default)]
    pub data: Value,
}

impl CompletionSignal {
    /// The `transaction` object of a SEP-24 record, or the payload itself when
    /// it is not wrapped.
    fn record(&self) -> &Value {
        match self.data.get("transaction") {
            Some(transaction) => transaction,
            None => &self.data,
        }
    }

    pub fn transaction_status(&self) -> Option<&str> {
        self.record().get("status").and_then(Value::as_str)
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.record().get("id").and_then(Value::as_str)
    }
}

/// Serialized origin (`scheme://host[:port]`) of a URL, as senders report it.
pub fn origin_of(url: &str) -> Result<String> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| HandoffError::MalformedResponse(format!("invalid provider url {url}: {e}")))?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(HandoffError::MalformedResponse(format!(
            "provider url {url} has no origin"
        )));
    }
    Ok(origin.ascii_serialization())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No completion subscription is active (no session, or already completed).
    NotSubscribed,
    UnexpectedOrigin(String),
    UnexpectedSource(Option<WindowId>),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotSubscribed => f.write_str("no active completion subscription"),
            IgnoreReason::UnexpectedOrigin(origin) => write!(f, "unexpected origin {origin}"),
            IgnoreReason::UnexpectedSource(Some(window)) => write!(f, "unexpected sender {window}"),
            IgnoreReason::UnexpectedSource(None) => f.write_str("unknown sender"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The signal completed the external flow of the current session.
    Completed,
    Ignored(IgnoreReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://pay.example/flow?id=T1&callback=postmessage").unwrap(),
            "https://pay.example"
        );
        assert_eq!(
            origin_of("http://localhost:8080/x").unwrap(),
            "http://localhost:8080"
        );
        assert!(origin_of("not a url").is_err());
        assert!(origin_of("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_sep24_record_accessors() {
        let signal = CompletionSignal {
            origin: "https://pay.example".into(),
            source: Some(WindowId(1)),
            data: json!({
                "transaction": {
                    "id": "T1",
                    "status": "pending_user_transfer_start",
                    "more_info_url": "https://pay.example/info/T1"
                }
            }),
        };
        assert_eq!(signal.transaction_id(), Some("T1"));
        assert_eq!(signal.transaction_status(), Some("pending_user_transfer_start"));
    }

    #[test]
    fn test_unwrapped_and_opaque_payloads() {
        let unwrapped = CompletionSignal {
            origin: "https://pay.example".into(),
            source: None,
            data: json!({ "id": "T2", "status": "completed" }),
        };
        assert_eq!(unwrapped.transaction_id(), Some("T2"));

        let opaque = CompletionSignal {
            origin: "https://pay.example".into(),
            source: None,
            data: json!("done"),
        };
        assert_eq!(opaque.transaction_status(), None);
        assert_eq!(opaque.transaction_id(), None);
    }

    #[test]
    fn test_signal_deserialization_defaults() {
        let signal: CompletionSignal =
            serde_json::from_str(r#"{ "origin": "https://pay.example" }"#).unwrap();
        assert_eq!(signal.source, None);
        assert_eq!(signal.data, Value::Null);
    }
}
