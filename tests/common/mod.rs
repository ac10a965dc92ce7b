#![allow(dead_code)]

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use handoff::application::controller::HandoffController;
use handoff::config::HandoffConfig;
use handoff::domain::messages::{SendConfirmationResponse, SendRequest, TransactionUrlResponse};
use handoff::domain::ports::TransactionBackend;
use handoff::error::{HandoffError, Result};
use handoff::infrastructure::in_memory::{InMemoryView, InMemoryWindowOpener};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub enum Reply<T> {
    Ok(T),
    Err(HandoffError),
    /// Never answers.
    Hang,
}

/// A backend answering from queues of scripted replies and recording requests.
#[derive(Default, Clone)]
pub struct ScriptedBackend {
    url_replies: Arc<Mutex<VecDeque<Reply<TransactionUrlResponse>>>>,
    send_replies: Arc<Mutex<VecDeque<Reply<SendConfirmationResponse>>>>,
    sent: Arc<Mutex<Vec<SendRequest>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_url(&self, reply: Reply<TransactionUrlResponse>) {
        self.url_replies.lock().await.push_back(reply);
    }

    pub async fn push_send(&self, reply: Reply<SendConfirmationResponse>) {
        self.send_replies.lock().await.push_back(reply);
    }

    pub async fn sent(&self) -> Vec<SendRequest> {
        self.sent.lock().await.clone()
    }
}

async fn answer<T>(reply: Option<Reply<T>>) -> Result<T> {
    match reply {
        Some(Reply::Ok(value)) => Ok(value),
        Some(Reply::Err(e)) => Err(e),
        Some(Reply::Hang) => std::future::pending::<Result<T>>().await,
        None => Err(HandoffError::Backend {
            endpoint: "unscripted".to_string(),
            status: 500,
        }),
    }
}

#[async_trait]
impl TransactionBackend for ScriptedBackend {
    async fn request_transaction_url(&self) -> Result<TransactionUrlResponse> {
        let reply = self.url_replies.lock().await.pop_front();
        answer(reply).await
    }

    async fn send_confirmation(&self, request: &SendRequest) -> Result<SendConfirmationResponse> {
        self.sent.lock().await.push(request.clone());
        let reply = self.send_replies.lock().await.pop_front();
        answer(reply).await
    }
}

pub fn url_response(txid: &str) -> TransactionUrlResponse {
    TransactionUrlResponse {
        url: format!("https://pay.example/{txid}"),
        txid: txid.to_string(),
    }
}

pub fn confirmation(ref_number: &str, url: &str) -> SendConfirmationResponse {
    SendConfirmationResponse {
        ref_number: ref_number.to_string(),
        url: url.to_string(),
    }
}

pub struct Harness {
    pub controller: HandoffController,
    pub backend: ScriptedBackend,
    pub windows: InMemoryWindowOpener,
    pub view: InMemoryView,
}

pub fn harness() -> Harness {
    harness_with(HandoffConfig::default())
}

pub fn harness_with(config: HandoffConfig) -> Harness {
    let backend = ScriptedBackend::new();
    let windows = InMemoryWindowOpener::new();
    let view = InMemoryView::new();
    let controller = HandoffController::new(
        Box::new(backend.clone()),
        Box::new(windows.clone()),
        Box::new(view.clone()),
        config,
    );
    Harness {
        controller,
        backend,
        windows,
        view,
    }
}

pub fn short_timeouts() -> HandoffConfig {
    HandoffConfig {
        request_timeout_secs: 1,
        finalize_timeout_secs: 1,
        completion_timeout_secs: 1,
        ..HandoffConfig::default()
    }
}

pub const SHORT: Duration = Duration::from_millis(50);

/// Serves `/url` and `/send` on an ephemeral port from a background thread
/// and returns its base URL. `/send` answers 400 for ids other than `T1`.
///
/// The same endpoints under `/flaky` fail the first `/send` with 503.
pub fn spawn_mock_backend() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, mock_router()).await.unwrap();
        });
    });

    format!("http://{addr}")
}

async fn provision() -> Json<Value> {
    Json(json!({
        "url": "https://pay.example/T1?callback=postmessage",
        "txid": "T1"
    }))
}

fn confirm(body: &Value) -> std::result::Result<Json<Value>, StatusCode> {
    if body["id"] == "T1" {
        Ok(Json(json!({
            "status": "ok",
            "refNumber": "REF123",
            "url": "https://pay.example/info/T1"
        })))
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}

fn mock_router() -> Router {
    let failed_once = Arc::new(AtomicBool::new(false));
    Router::new()
        .route("/url", get(provision))
        .route(
            "/send",
            post(|Json(body): Json<Value>| async move { confirm(&body) }),
        )
        .route("/flaky/url", get(provision))
        .route(
            "/flaky/send",
            post(move |Json(body): Json<Value>| {
                let failed_once = Arc::clone(&failed_once);
                async move {
                    if failed_once.swap(true, Ordering::SeqCst) {
                        confirm(&body)
                    } else {
                        Err(StatusCode::SERVICE_UNAVAILABLE)
                    }
                }
            }),
        )
        .route("/broken/url", get(|| async { Json(json!({ "url": "x" })) }))
}
