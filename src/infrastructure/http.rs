use crate::domain::messages::{SendConfirmationResponse, SendRequest, TransactionUrlResponse};
use crate::domain::ports::TransactionBackend;
use crate::error::{HandoffError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const URL_PATH: &str = "/url";
pub const SEND_PATH: &str = "/send";

/// The backend transaction service reached over JSON/HTTP.
///
/// Timeouts are left to the caller; the controller bounds every request.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a backend rooted at `base_url`, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| HandoffError::Config(format!("invalid server url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(HandoffError::Config(format!(
                "server url {base_url} cannot be a base"
            )));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }
}

/// Rejects non-2xx statuses and decodes the body, treating an undecodable body
/// the same as a missing field.
async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(HandoffError::Backend {
            endpoint: path.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await?;
    debug!(endpoint = path, body = %String::from_utf8_lossy(&body), "backend response");
    serde_json::from_slice(&body)
        .map_err(|e| HandoffError::MalformedResponse(format!("{path}: {e}")))
}

#[async_trait]
impl TransactionBackend for HttpBackend {
    async fn request_transaction_url(&self) -> Result<TransactionUrlResponse> {
        let url = self.endpoint(URL_PATH);
        debug!(%url, "making request: GET");
        let response = self.client.get(url).send().await?;
        decode(URL_PATH, response).await
    }

    async fn send_confirmation(&self, request: &SendRequest) -> Result<SendConfirmationResponse> {
        let url = self.endpoint(SEND_PATH);
        debug!(%url, id = %request.id, "making request: POST");
        let response = self.client.post(url).json(request).send().await?;
        decode(SEND_PATH, response).await
    }
}
