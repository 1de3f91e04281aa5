//! Appointment request form.

use crate::constants::messages;
use crate::intake::IntakeEndpoint;
use crate::patient::NormalizedPatient;
use crate::payload::{AppointmentPayload, PatientFields};
use crate::submission::{FormMessages, IntakeForm};
use cmf_types::is_blank;
use serde::{Deserialize, Serialize};

/// Specialty, preferred date and time slot are required; comments are optional.
///
/// Values are taken as entered. Specialty and time slot are expected to come from the fixed
/// catalogs but are not checked against them, and the date is not checked for being in the
/// future; the intake side confirms every request by phone or email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentForm {
    pub specialty: String,
    pub preferred_date: String,
    pub preferred_timeslot: String,
    pub comments: String,
}

impl AppointmentForm {
    fn required_fields_filled(&self) -> bool {
        !is_blank(&self.specialty)
            && !is_blank(&self.preferred_date)
            && !is_blank(&self.preferred_timeslot)
    }
}

impl IntakeForm for AppointmentForm {
    type Payload = AppointmentPayload;

    const ENDPOINT: IntakeEndpoint = IntakeEndpoint::Appointment;
    const MESSAGES: FormMessages = FormMessages {
        incomplete: messages::APPOINTMENT_INCOMPLETE,
        succeeded: messages::APPOINTMENT_SENT,
        rejected: messages::APPOINTMENT_FAILED,
    };

    fn is_ready(&self, patient: Option<&NormalizedPatient>) -> bool {
        patient.is_some() && self.required_fields_filled()
    }

    fn build_payload(&self, patient: &NormalizedPatient) -> AppointmentPayload {
        AppointmentPayload {
            patient: PatientFields::from(patient),
            specialty: self.specialty.trim().to_string(),
            preferred_date: self.preferred_date.trim().to_string(),
            preferred_timeslot: self.preferred_timeslot.trim().to_string(),
            comments: self.comments.clone(),
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeError;
    use crate::submission::testing::RecordingIntake;
    use crate::submission::{FailureReason, FormController, RequestState};
    use std::time::Duration;

    fn filled() -> AppointmentForm {
        AppointmentForm {
            specialty: "Cardiología".into(),
            preferred_date: "2026-11-02".into(),
            preferred_timeslot: "08:00 - 10:00".into(),
            comments: "Control anual".into(),
        }
    }

    fn patient() -> NormalizedPatient {
        NormalizedPatient {
            first_name: "Ana".into(),
            last_name: "Gomez".into(),
            email: "ana@x.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn requires_patient_and_three_fields() {
        assert!(filled().is_ready(Some(&patient())));
        assert!(!filled().is_ready(None));

        let mut form = filled();
        form.preferred_timeslot = " ".into();
        assert!(!form.is_ready(Some(&patient())));

        let mut form = filled();
        form.comments.clear();
        assert!(form.is_ready(Some(&patient())));
    }

    #[tokio::test]
    async fn success_sends_one_body_and_clears_form() {
        let intake = RecordingIntake::answering(Ok(()));
        let mut controller = FormController::new(filled(), Duration::from_secs(4));

        let report = controller.submit(&intake, Some(&patient())).await;

        assert_eq!(report.state, RequestState::Succeeded);
        assert_eq!(report.message, messages::APPOINTMENT_SENT);
        assert_eq!(controller.form(), &AppointmentForm::default());

        let sent = intake.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, IntakeEndpoint::Appointment);
        assert_eq!(sent[0].1["tipoConsulta"], "Cardiología");
        assert_eq!(sent[0].1["nombrePaciente"], "Ana");
        assert_eq!(sent[0].1["comentarios"], "Control anual");
    }

    #[tokio::test]
    async fn rejection_keeps_entered_values() {
        let intake = RecordingIntake::answering(Err(IntakeError::Rejected(500)));
        let mut controller = FormController::new(filled(), Duration::from_secs(4));

        let report = controller.submit(&intake, Some(&patient())).await;

        assert_eq!(
            report.state,
            RequestState::Failed(FailureReason::Rejected { status: 500 })
        );
        assert_eq!(report.message, messages::APPOINTMENT_FAILED);
        assert_eq!(controller.form(), &filled());
    }

    #[tokio::test]
    async fn missing_patient_is_incomplete_without_network_call() {
        let intake = RecordingIntake::answering(Ok(()));
        let mut controller = FormController::new(filled(), Duration::from_secs(4));

        let report = controller.submit(&intake, None).await;

        assert_eq!(report.message, messages::APPOINTMENT_INCOMPLETE);
        assert!(intake.sent().is_empty());
    }
}
