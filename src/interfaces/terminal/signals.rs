use super::window::OpenWindow;
use crate::domain::session::WindowId;
use crate::domain::signal::{CompletionSignal, origin_of};
use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lines typed by the user, shared between the completion relay and the host.
pub type LineSource = Arc<Mutex<mpsc::Receiver<String>>>;

/// Reads `input` line by line on a dedicated thread.
///
/// A blocking read never sits in the runtime, so the process can exit while the
/// user has not typed anything. The channel closes at end of input.
pub fn spawn_line_reader<R>(input: R) -> LineSource
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to read input");
                    break;
                }
            }
        }
    });
    Arc::new(Mutex::new(rx))
}

/// Turns a line typed by the user into the payload the provider would post.
///
/// A blank line carries no record; anything that is not JSON is kept as a
/// plain string.
pub fn payload_from_line(line: &str) -> Value {
    let line = line.trim();
    if line.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(line).unwrap_or_else(|_| Value::String(line.to_string()))
}

/// Relays completion from `lines` while a provider window is open.
///
/// One line is taken per opened window and delivered as a signal sent by that
/// window. Lines are only taken while a window is open, so input typed early
/// waits for the next window and input typed between windows stays available
/// to the host. The task ends when `lines` is exhausted or the receiver is
/// dropped, which closes the signal channel.
pub fn spawn_relay(
    lines: LineSource,
    mut windows: watch::Receiver<Option<OpenWindow>>,
    origin_override: Option<String>,
    signals: mpsc::Sender<CompletionSignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_signalled: Option<WindowId> = None;
        loop {
            let open = match windows
                .wait_for(|w| matches!(w, Some(open) if Some(open.id) != last_signalled))
                .await
            {
                Ok(current) => current.clone(),
                Err(_) => break,
            };
            let Some(open) = open else { continue };

            let line = {
                let mut lines = lines.lock().await;
                tokio::select! {
                    biased;
                    closed = windows.wait_for(|w| w.as_ref().map(|o| o.id) != Some(open.id)) => {
                        if closed.is_err() {
                            break;
                        }
                        // Window gone without completion; leave the input to the host.
                        continue;
                    }
                    line = lines.recv() => line,
                }
            };
            let Some(line) = line else { break };

            let origin = match &origin_override {
                Some(origin) => origin.clone(),
                None => match origin_of(&open.url) {
                    Ok(origin) => origin,
                    Err(e) => {
                        warn!(error = %e, "cannot relay completion");
                        continue;
                    }
                },
            };
            let signal = CompletionSignal {
                origin,
                source: Some(open.id),
                data: payload_from_line(&line),
            };
            debug!(window = %open.id, "relaying completion signal");
            if signals.send(signal).await.is_err() {
                break;
            }
            last_signalled = Some(open.id);
        }
    })
}
