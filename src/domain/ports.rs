use super::display::Display;
use super::messages::{SendConfirmationResponse, SendRequest, TransactionUrlResponse};
use super::session::WindowId;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// The backend that provisions provider URLs and confirms transactions.
#[async_trait]
pub trait TransactionBackend: Send + Sync {
    /// `GET /url`
    async fn request_transaction_url(&self) -> Result<TransactionUrlResponse>;
    /// `POST /send`
    async fn send_confirmation(&self, request: &SendRequest) -> Result<SendConfirmationResponse>;
}

/// Opens and closes the window (popup, webview or tab) hosting the provider flow.
#[async_trait]
pub trait WindowOpener: Send + Sync {
    async fn open(&self, url: &str, spec: &WindowSpec) -> Result<WindowId>;
    /// Closing a window that is already closed must be a no-op.
    async fn close(&self, window: WindowId);
}

/// Receives every change of the display.
#[async_trait]
pub trait View: Send + Sync {
    async fn render(&self, display: &Display);
}

pub type TransactionBackendBox = Box<dyn TransactionBackend>;
pub type WindowOpenerBox = Box<dyn WindowOpener>;
pub type ViewBox = Box<dyn View>;

/// Name and size of the provider window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            name: "webview".to_string(),
            width: 500,
            height: 800,
        }
    }
}

impl WindowSpec {
    /// Feature string in `window.open` syntax.
    pub fn features(&self) -> String {
        format!("width={},height={}", self.width, self.height)
    }
}
