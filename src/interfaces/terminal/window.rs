use crate::domain::ports::{WindowOpener, WindowSpec};
use crate::domain::session::WindowId;
use crate::error::{HandoffError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::warn;

/// The provider window currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenWindow {
    pub id: WindowId,
    pub url: String,
}

/// "Opens" the provider flow by printing its URL for the user to follow.
///
/// The open window is published on a watch channel so the stdin relay knows
/// which window a completion line belongs to.
pub struct TerminalWindow<W: Write + Send> {
    out: Arc<Mutex<W>>,
    next_id: Arc<AtomicU64>,
    current: Arc<watch::Sender<Option<OpenWindow>>>,
}

impl<W: Write + Send> TerminalWindow<W> {
    pub fn new(out: W) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            out: Arc::new(Mutex::new(out)),
            next_id: Arc::new(AtomicU64::new(1)),
            current: Arc::new(current),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<OpenWindow>> {
        self.current.subscribe()
    }

    pub fn current(&self) -> Option<OpenWindow> {
        self.current.borrow().clone()
    }
}

impl<W: Write + Send> Clone for TerminalWindow<W> {
    fn clone(&self) -> Self {
        Self {
            out: Arc::clone(&self.out),
            next_id: Arc::clone(&self.next_id),
            current: Arc::clone(&self.current),
        }
    }
}

fn announce<W: Write>(out: &mut W, url: &str, spec: &WindowSpec) -> std::io::Result<()> {
    writeln!(out, "open the provider flow ({}, {}): {url}", spec.name, spec.features())?;
    writeln!(
        out,
        "press Enter here when it is done, or paste the transaction record it returned"
    )?;
    out.flush()
}

#[async_trait]
impl<W: Write + Send> WindowOpener for TerminalWindow<W> {
    async fn open(&self, url: &str, spec: &WindowSpec) -> Result<WindowId> {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut out = self.out.lock().await;
            announce(&mut *out, url, spec)
                .map_err(|e| HandoffError::Window(format!("cannot show provider url: {e}")))?;
        }
        self.current.send_replace(Some(OpenWindow {
            id,
            url: url.to_string(),
        }));
        Ok(id)
    }

    async fn close(&self, window: WindowId) {
        let closed = self.current.send_if_modified(|current| {
            if current.as_ref().is_some_and(|open| open.id == window) {
                *current = None;
                true
            } else {
                false
            }
        });
        if closed {
            let mut out = self.out.lock().await;
            if let Err(e) = writeln!(out, "provider window closed").and_then(|_| out.flush()) {
                warn!(error = %e, "failed to write to terminal");
            }
        }
    }
}
