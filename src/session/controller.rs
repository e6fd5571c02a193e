//! Conversation controller
//!
//! Owns the transcript and session state of one diagnostic conversation and
//! drives every exchange with the diagnosis service. Front ends call the
//! operations here and render `snapshot()` and `panel()`.
//!
//! At most one exchange is in flight at a time. The state lock is never held
//! across an `.await`, and `reset()` moves the controller to a new epoch so a
//! response belonging to the previous session is dropped on arrival.

use crate::dispatcher::{self, Dispatch, DispatchContext, Panel};
use crate::error::{DiagchatError, Result};
use crate::guard;
use crate::service::{DiagnosisService, ExchangeRequest, ExchangeResponse, Prompt, VehicleMatch};
use crate::session::rewind::{self, RewindOutcome, RewindTarget};
use crate::session::transcript::{TranscriptStore, Turn};
use crate::step::{Action, Step};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle to whatever text affordance the front end shows
pub trait TextFocus: Send + Sync {
    /// Move input focus to the text affordance
    fn focus(&self);
}

/// Focus handle for front ends without a focusable text box
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFocus;

impl TextFocus for NoFocus {
    fn focus(&self) {}
}

/// Session-level state mirrored from the latest response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub session_id: Option<String>,
    pub current_step: Step,
    pub latest_prompt: Option<Prompt>,
    pub latest_diagnostic_turn: Option<u32>,
}

/// Read-only copy of the controller state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub turns: Vec<Turn>,
    pub session: Session,
    pub loading: bool,
    /// Suspicious text waiting for confirmation
    pub pending: Option<String>,
    /// Message of the most recent failed exchange, cleared by the next dispatch
    pub last_error: Option<String>,
}

/// What happened to text handed to `submit_text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input, nothing done
    Ignored,
    /// Forwarded to the service
    Sent,
    /// Held back as suspicious until confirmed
    Held,
}

/// Operator's answer to a held submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Discard the held text and return to the text box
    Rewrite,
    /// Forward the held text unchanged
    SendAnyway,
}

#[derive(Debug, Default)]
struct State {
    transcript: TranscriptStore,
    session: Session,
    loading: bool,
    pending: Option<String>,
    last_error: Option<String>,
    epoch: u64,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks an exchange as in flight until dropped
///
/// Dropping clears the loading flag only if no reset happened meanwhile, so
/// a stale exchange never unblocks the session that replaced it.
struct InFlight<'a> {
    state: &'a Mutex<State>,
    epoch: u64,
    session_id: Option<String>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if state.epoch == self.epoch {
            state.loading = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeKind {
    Forward,
    Rewind,
}

/// Result of a completed exchange
enum Applied {
    Current(Option<RewindOutcome>),
    Stale,
}

/// Orchestrates a diagnostic conversation
///
/// # Examples
///
/// ```no_run
/// use diagchat::config::ServiceConfig;
/// use diagchat::service::create_service;
/// use diagchat::session::{ConversationController, NoFocus};
/// use std::sync::Arc;
///
/// # async fn run() -> diagchat::Result<()> {
/// let service = create_service(&ServiceConfig::default())?;
/// let controller = ConversationController::new(service, Arc::new(NoFocus));
/// controller.start().await?;
/// controller.submit_text("エンジンがかからない").await?;
/// # Ok(())
/// # }
/// ```
pub struct ConversationController {
    service: Arc<dyn DiagnosisService>,
    focus: Arc<dyn TextFocus>,
    guard_enabled: bool,
    state: Mutex<State>,
}

impl ConversationController {
    /// Creates a controller with an empty transcript at `vehicle_id`
    pub fn new(service: Arc<dyn DiagnosisService>, focus: Arc<dyn TextFocus>) -> Self {
        Self {
            service,
            focus,
            guard_enabled: true,
            state: Mutex::new(State::default()),
        }
    }

    /// Enables or disables the suspicious input check in `submit_text`
    pub fn with_guard(mut self, enabled: bool) -> Self {
        self.guard_enabled = enabled;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Opens the session with an empty exchange
    ///
    /// # Errors
    ///
    /// Returns `ExchangeInFlight` if another exchange is pending, or
    /// `ExchangeFailed` if the service call fails
    pub async fn start(&self) -> Result<()> {
        self.exchange(ExchangeKind::Forward, None, |_| ExchangeRequest::start())
            .await
            .map(|_| ())
    }

    /// Sends free text, bypassing the input guard
    ///
    /// Blank text is ignored. The text is appended as a user turn before the
    /// exchange and stays in the transcript if the exchange fails.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeInFlight` if another exchange is pending, or
    /// `ExchangeFailed` if the service call fails
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.exchange(ExchangeKind::Forward, Some(text), |session_id| {
            ExchangeRequest::message(session_id, text)
        })
        .await
        .map(|_| ())
    }

    /// Sends a named action
    ///
    /// When `label` is given it is appended as a user turn before the
    /// exchange.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeInFlight` if another exchange is pending, or
    /// `ExchangeFailed` if the service call fails
    pub async fn send_action(&self, action: Action, value: &str, label: Option<&str>) -> Result<()> {
        self.exchange(ExchangeKind::Forward, label, |session_id| {
            ExchangeRequest::action(session_id, action, value)
        })
        .await
        .map(|_| ())
    }

    /// Asks the service to rewind to a diagnostic turn
    ///
    /// On success the transcript is cut at the server's checkpoint and the
    /// new prompt appended. Returns `None` if a reset made the response
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeInFlight` if another exchange is pending, or
    /// `ExchangeFailed` if the service call fails
    pub async fn rewind(&self, turn: u32) -> Result<Option<RewindOutcome>> {
        let applied = self
            .exchange(ExchangeKind::Rewind, None, |session_id| {
                ExchangeRequest::rewind(session_id, turn)
            })
            .await?;

        Ok(match applied {
            Applied::Current(outcome) => outcome,
            Applied::Stale => None,
        })
    }

    /// Drops all local state and starts a new epoch
    ///
    /// No request is made; the remote session is simply abandoned. Calling
    /// this twice is the same as calling it once.
    pub fn reset(&self) {
        let mut state = self.state();
        let session_id = state.session.session_id.take();
        state.transcript.clear();
        state.session = Session::default();
        state.loading = false;
        state.pending = None;
        state.last_error = None;
        state.epoch += 1;

        if let Some(session_id) = session_id {
            tracing::info!(%session_id, "Conversation reset");
        }
    }

    /// Submits typed text, holding it back if it looks accidental
    ///
    /// The guard only applies while at `free_text` or `diagnosing`.
    ///
    /// # Errors
    ///
    /// Returns the `send_message` errors when the text is forwarded
    pub async fn submit_text(&self, text: &str) -> Result<Submission> {
        if text.trim().is_empty() {
            return Ok(Submission::Ignored);
        }

        let held = {
            let mut state = self.state();
            let suspicious = self.guard_enabled
                && state.session.current_step.is_guarded()
                && guard::classify(text);
            if suspicious {
                tracing::debug!(text, "Holding suspicious input for confirmation");
                state.pending = Some(text.to_string());
            }
            suspicious
        };

        if held {
            return Ok(Submission::Held);
        }

        self.send_message(text).await?;
        Ok(Submission::Sent)
    }

    /// Resolves a held submission
    ///
    /// Does nothing when nothing is held.
    ///
    /// # Errors
    ///
    /// Returns the `send_message` errors for `SendAnyway`
    pub async fn resolve_pending(&self, decision: GuardDecision) -> Result<()> {
        let Some(text) = self.state().pending.take() else {
            return Ok(());
        };

        match decision {
            GuardDecision::Rewrite => {
                self.focus.focus();
                Ok(())
            }
            GuardDecision::SendAnyway => self.send_message(&text).await,
        }
    }

    /// Selects one of the current affordance's choices
    ///
    /// # Errors
    ///
    /// Returns `NotSelectable` if the current affordance has no choices,
    /// otherwise the errors of the dispatched operation
    pub async fn select(&self, choice: &crate::service::Choice) -> Result<()> {
        let panel = self.panel();
        let mode = panel.affordance.selection_mode().ok_or_else(|| {
            DiagchatError::NotSelectable(format!("{:?} has no choices", panel.affordance))
        })?;
        self.perform(mode.select(choice)).await
    }

    /// Executes a dispatch produced by the dispatcher
    ///
    /// # Errors
    ///
    /// Returns the errors of the underlying `send_action` / `send_message`
    pub async fn perform(&self, dispatch: Dispatch) -> Result<()> {
        match dispatch {
            Dispatch::Action {
                action,
                value,
                label,
            } => self.send_action(action, &value, label.as_deref()).await,
            Dispatch::Message(text) => self.send_message(&text).await,
            Dispatch::FocusText => {
                self.focus.focus();
                Ok(())
            }
        }
    }

    /// Picks a vehicle from a lookup result
    ///
    /// # Errors
    ///
    /// Returns the `send_action` errors
    pub async fn select_vehicle(&self, found: &VehicleMatch) -> Result<()> {
        let label = found.vehicle.display_name();
        self.send_action(Action::SelectVehicle, &found.vehicle.id, Some(&label))
            .await
    }

    /// Submits the booking form without adding a user turn
    ///
    /// # Errors
    ///
    /// Returns `MissingBookingFields` with the labels of blank required
    /// fields without contacting the service, otherwise the `send_action`
    /// errors
    pub async fn submit_booking(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let fields = self
            .state()
            .session
            .latest_prompt
            .as_ref()
            .and_then(|prompt| prompt.booking_fields.clone())
            .unwrap_or_default();

        let missing: Vec<String> = fields
            .iter()
            .filter(|field| field.required)
            .filter(|field| {
                values
                    .get(&field.name)
                    .map_or(true, |value| value.trim().is_empty())
            })
            .map(|field| field.label.clone())
            .collect();

        if !missing.is_empty() {
            return Err(DiagchatError::MissingBookingFields(missing).into());
        }

        let payload = serde_json::to_string(values)?;
        self.send_action(Action::SubmitBooking, &payload, None).await
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state();
        Snapshot {
            turns: state.transcript.turns().to_vec(),
            session: state.session.clone(),
            loading: state.loading,
            pending: state.pending.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// Interactive panel for the current state
    pub fn panel(&self) -> Panel {
        let state = self.state();
        dispatcher::dispatch(DispatchContext {
            step: state.session.current_step,
            prompt: state.session.latest_prompt.as_ref(),
            loading: state.loading,
            pending: state.pending.as_deref(),
        })
    }

    /// User turns currently offering "redo from here"
    pub fn rewind_targets(&self) -> Vec<RewindTarget> {
        let state = self.state();
        rewind::rewind_targets(state.session.current_step, state.transcript.turns())
    }

    fn begin(&self, optimistic: Option<&str>) -> Result<InFlight<'_>> {
        let mut state = self.state();
        if state.loading {
            return Err(DiagchatError::ExchangeInFlight.into());
        }

        if let Some(content) = optimistic {
            let diagnostic_turn = if state.session.current_step.is_diagnosing() {
                state.session.latest_diagnostic_turn
            } else {
                None
            };
            state.transcript.push_user(content, diagnostic_turn);
        }

        state.loading = true;
        state.last_error = None;
        state.pending = None;

        Ok(InFlight {
            state: &self.state,
            epoch: state.epoch,
            session_id: state.session.session_id.clone(),
        })
    }

    async fn exchange<F>(
        &self,
        kind: ExchangeKind,
        optimistic: Option<&str>,
        build: F,
    ) -> Result<Applied>
    where
        F: FnOnce(Option<String>) -> ExchangeRequest,
    {
        let flight = self.begin(optimistic)?;
        let request = build(flight.session_id.clone());

        let result = self.service.exchange(&request).await;

        let mut state = self.state();
        if state.epoch != flight.epoch {
            tracing::warn!("Discarding response that arrived after a reset");
            drop(state);
            return match result {
                Ok(_) => Ok(Applied::Stale),
                Err(e) => Err(exchange_failed(e).into()),
            };
        }

        let applied = match result {
            Ok(response) => Ok(Applied::Current(apply(&mut state, response, kind))),
            Err(e) => {
                let error = exchange_failed(e);
                tracing::error!("{}", error);
                state.last_error = Some(error.to_string());
                Err(error.into())
            }
        };
        drop(state);
        drop(flight);
        applied
    }
}

fn exchange_failed(error: anyhow::Error) -> DiagchatError {
    match error.downcast::<DiagchatError>() {
        Ok(DiagchatError::ExchangeFailed(message)) => DiagchatError::ExchangeFailed(message),
        Ok(other) => DiagchatError::ExchangeFailed(other.to_string()),
        Err(other) => DiagchatError::ExchangeFailed(other.to_string()),
    }
}

fn apply(state: &mut State, response: ExchangeResponse, kind: ExchangeKind) -> Option<RewindOutcome> {
    match &state.session.session_id {
        None => {
            tracing::info!(session_id = %response.session_id, "Session started");
            state.session.session_id = Some(response.session_id.clone());
        }
        Some(current) if *current != response.session_id => {
            tracing::warn!(
                session_id = %current,
                received = %response.session_id,
                "Ignoring session id change from service"
            );
        }
        Some(_) => {}
    }

    let outcome = match kind {
        ExchangeKind::Rewind => Some(rewind::truncate(
            &mut state.transcript,
            response.rewound_to_turn,
        )),
        ExchangeKind::Forward => None,
    };

    if response.current_step != state.session.current_step {
        tracing::debug!(
            from = %state.session.current_step,
            to = %response.current_step,
            "Step changed"
        );
        state.pending = None;
    }

    state.session.current_step = response.current_step;
    if response.diagnostic_turn.is_some() {
        state.session.latest_diagnostic_turn = response.diagnostic_turn;
    }
    state.transcript.push_assistant(&response);
    state.session.latest_prompt = Some(response.prompt);

    outcome
}
