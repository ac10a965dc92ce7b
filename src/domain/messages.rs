//! JSON payloads exchanged with the backend transaction service.

use serde::{Deserialize, Serialize};

/// Response of `GET /url`: the provider's interactive URL and the transaction id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionUrlResponse {
    pub url: String,
    pub txid: String,
}

/// Body of `POST /send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub id: String,
}

/// Response of `POST /send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendConfirmationResponse {
    #[serde(rename = "refNumber")]
    pub ref_number: String,
    /// Informational follow-up link for the user.
    pub url: String,
}
