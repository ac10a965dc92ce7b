use crate::config::HandoffConfig;
use crate::domain::display::{Display, RESTART_LABEL, START_LABEL};
use crate::domain::messages::{SendConfirmationResponse, SendRequest};
use crate::domain::ports::{TransactionBackendBox, ViewBox, WindowOpenerBox};
use crate::domain::session::{Phase, Session, SessionToken, TransactionId};
use crate::domain::signal::{CompletionSignal, IgnoreReason, SignalOutcome, origin_of};
use crate::error::{HandoffError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Drives one provider-hosted transaction at a time.
///
/// The controller owns the session, so every operation goes through `&mut self`
/// and a second `start` or `finalize` cannot run while one is in flight. Each
/// awaited external operation is bounded by a timeout from `HandoffConfig`;
/// on failure the controller falls back to the last stable phase and renders
/// the error.
pub struct HandoffController {
    backend: TransactionBackendBox,
    windows: WindowOpenerBox,
    view: ViewBox,
    config: HandoffConfig,
    phase: Phase,
    session: Option<Session>,
    display: Display,
    /// Start label to restore when a session is abandoned.
    idle_label: &'static str,
    next_token: u64,
}

impl HandoffController {
    pub fn new(
        backend: TransactionBackendBox,
        windows: WindowOpenerBox,
        view: ViewBox,
        config: HandoffConfig,
    ) -> Self {
        Self {
            backend,
            windows,
            view,
            config,
            phase: Phase::Idle,
            session: None,
            display: Display::default(),
            idle_label: START_LABEL,
            next_token: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The current session, or the last finished one while idle.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Pushes the initial display to the view.
    pub async fn show(&self) {
        self.view.render(&self.display).await;
    }

    /// Starts a new session: provisions a transaction with the backend and
    /// opens the provider window on its URL.
    ///
    /// `Idle -> Starting -> AwaitingCompletion`. On failure the session is
    /// dropped and the start control is enabled again.
    pub async fn start(&mut self) -> Result<SessionToken> {
        if self.phase != Phase::Idle {
            return Err(HandoffError::InvalidState {
                operation: "start",
                phase: self.phase,
            });
        }

        let token = SessionToken(self.next_token);
        self.next_token += 1;
        self.session = Some(Session::new(token));
        self.phase = Phase::Starting;
        self.display.loading();
        self.view.render(&self.display).await;
        info!(session = %token, "starting transaction");

        match self.open_session().await {
            Ok(()) => {
                self.phase = Phase::AwaitingCompletion;
                self.view.render(&self.display).await;
                Ok(token)
            }
            Err(e) => {
                warn!(session = %token, error = %e, "start failed");
                self.abandon(Some(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn open_session(&mut self) -> Result<()> {
        let response = bounded(
            "GET /url",
            self.config.request_timeout(),
            self.backend.request_transaction_url(),
        )
        .await?;

        let transaction_id = TransactionId::new(response.txid)?;
        let expected_origin = match &self.config.provider_origin {
            Some(origin) => origin.clone(),
            None => origin_of(&response.url)?,
        };
        if let Some(session) = self.session.as_mut() {
            session.record_transaction(transaction_id.clone());
        }
        self.display.in_progress();

        let window = self.windows.open(&response.url, &self.config.window).await?;
        if let Some(session) = self.session.as_mut() {
            session.attach_window(window, expected_origin);
        }
        info!(
            transaction = %transaction_id,
            window = %window,
            "provider flow opened, awaiting completion"
        );
        Ok(())
    }

    /// Handles a cross-window message.
    ///
    /// The first signal from this session's window and the expected origin
    /// closes the window and enables finalize. Anything else, including
    /// duplicates, is ignored.
    pub async fn on_signal(&mut self, signal: CompletionSignal) -> SignalOutcome {
        let Some(session) = self.session.as_mut() else {
            return SignalOutcome::Ignored(IgnoreReason::NotSubscribed);
        };
        if let Err(reason) = session.check_signal(&signal) {
            debug!(session = %session.token(), %reason, "ignoring message");
            return SignalOutcome::Ignored(reason);
        }

        session.unsubscribe();
        let window = session.take_window();
        if let (Some(expected), Some(reported)) =
            (session.transaction_id(), signal.transaction_id())
            && expected.as_str() != reported
        {
            warn!(%expected, reported, "completion record names another transaction");
        }
        info!(
            session = %session.token(),
            status = signal.transaction_status().unwrap_or("unknown"),
            "provider flow completed"
        );

        self.phase = Phase::ReadyToFinalize;
        self.display.ready_to_send();
        if let Some(window) = window {
            self.windows.close(window).await;
        }
        self.view.render(&self.display).await;
        SignalOutcome::Completed
    }

    /// Feeds signals from `signals` into `on_signal` until one completes the
    /// flow, bounded by the completion timeout. When the bound expires or the
    /// source goes away, the session is abandoned and its window closed.
    pub async fn await_completion(
        &mut self,
        signals: &mut mpsc::Receiver<CompletionSignal>,
    ) -> Result<()> {
        if self.phase != Phase::AwaitingCompletion {
            return Err(HandoffError::InvalidState {
                operation: "await completion",
                phase: self.phase,
            });
        }

        let after = self.config.completion_timeout();
        // A bound too large to represent means no deadline at all.
        let deadline = tokio::time::Instant::now().checked_add(after);
        loop {
            let received = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, signals.recv()).await,
                None => Ok(signals.recv().await),
            };
            match received {
                Ok(Some(signal)) => {
                    if self.on_signal(signal).await == SignalOutcome::Completed {
                        return Ok(());
                    }
                }
                Ok(None) => {
                    let err = HandoffError::Window(
                        "signal source closed before the provider flow completed".to_string(),
                    );
                    self.abandon(Some(err.to_string())).await;
                    return Err(err);
                }
                Err(_) => {
                    let err = HandoffError::Timeout {
                        operation: "provider flow",
                        after,
                    };
                    warn!(error = %err, "abandoning session");
                    self.abandon(Some(err.to_string())).await;
                    return Err(err);
                }
            }
        }
    }

    /// Confirms the completed transaction with the backend and shows the
    /// returned reference number and info link.
    ///
    /// `ReadyToFinalize -> Finalizing -> Idle`. On failure the controller stays
    /// ready to finalize so the user can send again.
    pub async fn finalize(&mut self) -> Result<SendConfirmationResponse> {
        if self.phase != Phase::ReadyToFinalize {
            return Err(HandoffError::InvalidState {
                operation: "finalize",
                phase: self.phase,
            });
        }
        let transaction_id = self
            .session
            .as_ref()
            .and_then(Session::transaction_id)
            .cloned()
            .ok_or(HandoffError::MissingTransactionId)?;

        self.phase = Phase::Finalizing;
        self.display.sending();
        self.view.render(&self.display).await;
        info!(transaction = %transaction_id, "sending confirmation");

        let request = SendRequest {
            id: transaction_id.to_string(),
        };
        let result = bounded(
            "POST /send",
            self.config.finalize_timeout(),
            self.backend.send_confirmation(&request),
        )
        .await;

        match result {
            Ok(confirmation) => {
                self.phase = Phase::Idle;
                self.idle_label = RESTART_LABEL;
                self.display
                    .confirmed(&confirmation.ref_number, &confirmation.url);
                self.view.render(&self.display).await;
                info!(
                    transaction = %transaction_id,
                    reference = %confirmation.ref_number,
                    "transaction confirmed"
                );
                Ok(confirmation)
            }
            Err(e) => {
                if e.is_transport() {
                    warn!(transaction = %transaction_id, error = %e, "send failed");
                }
                self.phase = self.phase.stable();
                self.display.send_failed(e.to_string());
                self.view.render(&self.display).await;
                Err(e)
            }
        }
    }

    /// Returns an interrupted session to a stable phase.
    ///
    /// Needed after a `start` or `finalize` future was dropped mid-flight, and
    /// to give up on a provider flow the user will not finish. A session still
    /// starting or awaiting completion is abandoned; an interrupted send goes
    /// back to ready-to-finalize.
    pub async fn cancel(&mut self) {
        let stable = self.phase.stable();
        if stable == self.phase {
            return;
        }
        info!(phase = %self.phase, "cancelling");
        if stable == Phase::ReadyToFinalize {
            self.phase = stable;
            self.display.send_failed("send cancelled".to_string());
            self.view.render(&self.display).await;
        } else {
            self.abandon(None).await;
        }
    }

    async fn abandon(&mut self, message: Option<String>) {
        if let Some(mut session) = self.session.take() {
            session.unsubscribe();
            if let Some(window) = session.take_window() {
                self.windows.close(window).await;
            }
        }
        self.phase = self.phase.stable();
        self.display.start_failed(self.idle_label, message);
        self.view.render(&self.display).await;
    }
}

async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    request: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, request)
        .await
        .map_err(|_| HandoffError::Timeout { operation, after })?
}
