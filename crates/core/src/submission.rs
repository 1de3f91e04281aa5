//! Submission lifecycle shared by the prescription and appointment forms.
//!
//! A [`FormController`] owns one form, its [`RequestState`] and the transient [`Notice`]
//! shown to the user. Submitting goes through two steps so that callers holding the
//! controller behind a lock can release it while the network call runs:
//!
//! 1. [`FormController::prepare`] checks readiness and the in-flight guard, moves the state to
//!    `Submitting` and returns the body to send.
//! 2. [`FormController::complete`] records the intake outcome, resetting the form on success.
//!
//! Field edits remain possible in every state; only a second submit is refused while one is
//! outstanding.

use crate::constants::{messages, DEFAULT_NOTICE_SECS};
use crate::intake::{IntakeClient, IntakeEndpoint, IntakeError};
use crate::patient::NormalizedPatient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A form that can be submitted to the intake API.
pub trait IntakeForm {
    type Payload: Serialize + Sync;

    const ENDPOINT: IntakeEndpoint;
    const MESSAGES: FormMessages;

    /// Whether the form may be submitted for `patient`.
    fn is_ready(&self, patient: Option<&NormalizedPatient>) -> bool;

    fn build_payload(&self, patient: &NormalizedPatient) -> Self::Payload;

    /// Return every mutable field to its initial empty value.
    fn reset(&mut self);
}

/// Localized messages a form shows for each outcome.
#[derive(Debug, Clone, Copy)]
pub struct FormMessages {
    pub incomplete: &'static str,
    pub succeeded: &'static str,
    pub rejected: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Required fields were missing; nothing was sent.
    Incomplete,
    /// The intake API answered with a non-success status.
    Rejected { status: u16 },
    /// No response was received.
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    Submitting,
    Succeeded,
    Failed(FailureReason),
}

impl RequestState {
    /// Field editing is always allowed; this reports whether a submit would be accepted.
    pub fn accepts_submit(&self) -> bool {
        !matches!(self, RequestState::Submitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message that disappears on its own once `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Why a submit never reached the intake API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRefused {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("required fields are missing")]
    Incomplete,
}

/// Result of a finished submit attempt, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReport {
    pub state: RequestState,
    pub message: String,
}

/// A body ready to be sent, handed out by [`FormController::prepare`].
#[derive(Debug, Clone)]
pub struct PreparedSubmission<P> {
    pub endpoint: IntakeEndpoint,
    pub payload: P,
}

#[derive(Debug)]
pub struct FormController<F> {
    form: F,
    state: RequestState,
    notice: Option<Notice>,
    notice_window: chrono::Duration,
}

impl<F: IntakeForm> FormController<F> {
    pub fn new(form: F, notice_window: Duration) -> Self {
        Self {
            form,
            state: RequestState::Idle,
            notice: None,
            notice_window: chrono::Duration::from_std(notice_window)
                .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_NOTICE_SECS as i64)),
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// The current notice, if one is set and has not expired at `now`.
    pub fn notice_at(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_visible_at(now))
    }

    /// Validate and enter `Submitting`.
    ///
    /// # Errors
    ///
    /// - `SubmitRefused::InFlight` if a previous submit has not completed; state and notice
    ///   are left untouched.
    /// - `SubmitRefused::Incomplete` if the form is not ready; the state becomes
    ///   `Failed(Incomplete)` and the form's "incomplete" notice is shown.
    pub fn prepare(
        &mut self,
        patient: Option<&NormalizedPatient>,
        now: DateTime<Utc>,
    ) -> Result<PreparedSubmission<F::Payload>, SubmitRefused> {
        if !self.state.accepts_submit() {
            return Err(SubmitRefused::InFlight);
        }

        let anonymous = NormalizedPatient::default();
        let patient = match patient {
            Some(p) if self.form.is_ready(Some(p)) => p,
            None if self.form.is_ready(None) => &anonymous,
            _ => {
                self.state = RequestState::Failed(FailureReason::Incomplete);
                self.show(NoticeKind::Error, F::MESSAGES.incomplete, now);
                return Err(SubmitRefused::Incomplete);
            }
        };

        self.state = RequestState::Submitting;
        Ok(PreparedSubmission {
            endpoint: F::ENDPOINT,
            payload: self.form.build_payload(patient),
        })
    }

    /// Record the outcome of the intake call started by [`FormController::prepare`].
    pub fn complete(
        &mut self,
        outcome: Result<(), IntakeError>,
        now: DateTime<Utc>,
    ) -> SubmitReport {
        match outcome {
            Ok(()) => {
                self.form.reset();
                self.state = RequestState::Succeeded;
                self.show(NoticeKind::Success, F::MESSAGES.succeeded, now);
            }
            Err(IntakeError::Rejected(status)) => {
                self.state = RequestState::Failed(FailureReason::Rejected { status });
                self.show(NoticeKind::Error, F::MESSAGES.rejected, now);
            }
            Err(IntakeError::Transport(reason)) => {
                tracing::warn!(endpoint = F::ENDPOINT.path(), %reason, "intake transport failure");
                self.state = RequestState::Failed(FailureReason::Transport);
                self.show(NoticeKind::Error, messages::CONNECTION_FAILED, now);
            }
        }

        self.report()
    }

    /// Give up on a submit whose outcome will never arrive.
    ///
    /// Only acts while `Submitting`; the form is kept and the connection-failure notice shown.
    pub fn abandon(&mut self, now: DateTime<Utc>) {
        if self.state != RequestState::Submitting {
            return;
        }
        tracing::warn!(endpoint = F::ENDPOINT.path(), "submission abandoned before completion");
        self.state = RequestState::Failed(FailureReason::Transport);
        self.show(NoticeKind::Error, messages::CONNECTION_FAILED, now);
    }

    /// Prepare, send and complete in one call.
    pub async fn submit<C: IntakeClient>(
        &mut self,
        client: &C,
        patient: Option<&NormalizedPatient>,
    ) -> SubmitReport {
        match self.prepare(patient, Utc::now()) {
            Ok(prepared) => {
                let outcome = client.post(prepared.endpoint, &prepared.payload).await;
                self.complete(outcome, Utc::now())
            }
            Err(_) => self.report(),
        }
    }

    fn report(&self) -> SubmitReport {
        SubmitReport {
            state: self.state,
            message: self
                .notice
                .as_ref()
                .map(|n| n.text.clone())
                .unwrap_or_default(),
        }
    }

    fn show(&mut self, kind: NoticeKind, text: &str, now: DateTime<Utc>) {
        self.notice = Some(Notice {
            kind,
            text: text.to_string(),
            expires_at: now + self.notice_window,
        });
    }
}

/// Submit a controller shared behind a mutex without holding the lock across the network
/// call, so edits from other handlers still go through while the request is outstanding.
///
/// # Errors
///
/// Returns `SubmitRefused::InFlight` when another submit on the same controller has not
/// completed. An incomplete form is reported through `Ok` with `Failed(Incomplete)`.
pub async fn submit_shared<F, C>(
    controller: &Mutex<FormController<F>>,
    client: &C,
    patient: Option<&NormalizedPatient>,
) -> Result<SubmitReport, SubmitRefused>
where
    F: IntakeForm + Send,
    F::Payload: Send,
    C: IntakeClient + Sync,
{
    let prepared = {
        let mut guard = controller.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.prepare(patient, Utc::now()) {
            Ok(prepared) => prepared,
            Err(SubmitRefused::Incomplete) => return Ok(guard.report()),
            Err(SubmitRefused::InFlight) => return Err(SubmitRefused::InFlight),
        }
    };

    // Dropping this future mid-request must not leave the controller in `Submitting`.
    let pending = PendingSubmit {
        controller,
        settled: false,
    };
    let outcome = client.post(prepared.endpoint, &prepared.payload).await;
    Ok(pending.settle(outcome))
}

/// Abandons the submit on drop unless [`PendingSubmit::settle`] ran.
struct PendingSubmit<'a, F: IntakeForm> {
    controller: &'a Mutex<FormController<F>>,
    settled: bool,
}

impl<F: IntakeForm> PendingSubmit<'_, F> {
    fn settle(mut self, outcome: Result<(), IntakeError>) -> SubmitReport {
        self.settled = true;
        let mut guard = self.controller.lock().unwrap_or_else(PoisonError::into_inner);
        guard.complete(outcome, Utc::now())
    }
}

impl<F: IntakeForm> Drop for PendingSubmit<'_, F> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .abandon(Utc::now());
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use serde_json::Value;
    use std::future::Future;
    use std::sync::Arc;

    /// Intake client that records bodies and answers with a fixed outcome.
    #[derive(Clone)]
    pub struct RecordingIntake {
        pub outcome: Result<(), IntakeError>,
        pub sent: Arc<Mutex<Vec<(IntakeEndpoint, Value)>>>,
    }

    impl RecordingIntake {
        pub fn answering(outcome: Result<(), IntakeError>) -> Self {
            Self {
                outcome,
                sent: Arc::default(),
            }
        }

        pub fn sent(&self) -> Vec<(IntakeEndpoint, Value)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl IntakeClient for RecordingIntake {
        fn post<P>(
            &self,
            endpoint: IntakeEndpoint,
            payload: &P,
        ) -> impl Future<Output = Result<(), IntakeError>> + Send
        where
            P: Serialize + Sync,
        {
            let body = serde_json::to_value(payload).unwrap();
            self.sent.lock().unwrap().push((endpoint, body));
            let outcome = self.outcome.clone();
            async move { outcome }
        }
    }

    /// Intake client whose requests never complete.
    pub struct HangingIntake;

    impl IntakeClient for HangingIntake {
        fn post<P>(
            &self,
            _endpoint: IntakeEndpoint,
            _payload: &P,
        ) -> impl Future<Output = Result<(), IntakeError>> + Send
        where
            P: Serialize + Sync,
        {
            std::future::pending()
        }
    }
}
