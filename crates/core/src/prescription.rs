//! Prescription request form.

use crate::constants::{messages, OTHER_SENTINEL};
use crate::intake::IntakeEndpoint;
use crate::patient::NormalizedPatient;
use crate::payload::{MedicationEntry, PatientFields, PrescriptionPayload};
use crate::submission::{FormMessages, IntakeForm};
use cmf_types::is_blank;
use serde::{Deserialize, Serialize};

/// One medication row as entered by the patient.
///
/// `commercial_name` and `pharmaceutical_form` hold a catalog value; when that value is
/// [`OTHER_SENTINEL`] the matching `*_other` field carries the real text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationLineItem {
    pub generic_name: String,
    pub commercial_name: String,
    pub commercial_name_other: String,
    pub dosage: String,
    pub pharmaceutical_form: String,
    pub pharmaceutical_form_other: String,
    pub monthly_quantity: String,
}

/// Required medication fields, used to report what is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MedicationField {
    CommercialName,
    CommercialNameOther,
    Dosage,
    PharmaceuticalForm,
    PharmaceuticalFormOther,
    MonthlyQuantity,
}

impl MedicationLineItem {
    /// Required fields that are still blank, honouring the "Otro" override rule.
    pub fn missing_fields(&self) -> Vec<MedicationField> {
        let mut missing = Vec::new();

        if is_blank(&self.commercial_name) {
            missing.push(MedicationField::CommercialName);
        } else if self.commercial_name == OTHER_SENTINEL && is_blank(&self.commercial_name_other) {
            missing.push(MedicationField::CommercialNameOther);
        }
        if is_blank(&self.dosage) {
            missing.push(MedicationField::Dosage);
        }
        if is_blank(&self.pharmaceutical_form) {
            missing.push(MedicationField::PharmaceuticalForm);
        } else if self.pharmaceutical_form == OTHER_SENTINEL
            && is_blank(&self.pharmaceutical_form_other)
        {
            missing.push(MedicationField::PharmaceuticalFormOther);
        }
        if is_blank(&self.monthly_quantity) {
            missing.push(MedicationField::MonthlyQuantity);
        }

        missing
    }

    pub fn is_ready(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Commercial name to send: the free text when "Otro" was selected.
    pub fn resolved_commercial_name(&self) -> &str {
        resolve(&self.commercial_name, &self.commercial_name_other)
    }

    /// Pharmaceutical form to send: the free text when "Otro" was selected.
    pub fn resolved_pharmaceutical_form(&self) -> &str {
        resolve(&self.pharmaceutical_form, &self.pharmaceutical_form_other)
    }

    pub fn to_entry(&self) -> MedicationEntry {
        MedicationEntry {
            generic_name: self.generic_name.trim().to_string(),
            commercial_name: self.resolved_commercial_name().to_string(),
            dosage: self.dosage.trim().to_string(),
            pharmaceutical_form: self.resolved_pharmaceutical_form().to_string(),
            monthly_quantity: self.monthly_quantity.trim().to_string(),
        }
    }
}

fn resolve<'a>(selected: &'a str, other: &'a str) -> &'a str {
    if selected == OTHER_SENTINEL {
        other.trim()
    } else {
        selected.trim()
    }
}

/// The prescription form: at least one medication row plus free-text observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PrescriptionFormDoc")]
pub struct PrescriptionForm {
    medications: Vec<MedicationLineItem>,
    pub observations: String,
}

/// Deserialized shape before the one-row minimum is applied.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PrescriptionFormDoc {
    medications: Vec<MedicationLineItem>,
    observations: String,
}

impl From<PrescriptionFormDoc> for PrescriptionForm {
    fn from(doc: PrescriptionFormDoc) -> Self {
        Self::with_medications(doc.medications, doc.observations)
    }
}

impl Default for PrescriptionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl PrescriptionForm {
    /// A form with a single blank medication row.
    pub fn new() -> Self {
        Self {
            medications: vec![MedicationLineItem::default()],
            observations: String::new(),
        }
    }

    /// Build a form from rows; an empty list gets one blank row.
    pub fn with_medications(medications: Vec<MedicationLineItem>, observations: String) -> Self {
        let mut form = Self {
            medications,
            observations,
        };
        if form.medications.is_empty() {
            form.medications.push(MedicationLineItem::default());
        }
        form
    }

    pub fn medications(&self) -> &[MedicationLineItem] {
        &self.medications
    }

    pub fn medication_mut(&mut self, index: usize) -> Option<&mut MedicationLineItem> {
        self.medications.get_mut(index)
    }

    /// Append a blank medication row and return its index.
    pub fn add_medication(&mut self) -> usize {
        self.medications.push(MedicationLineItem::default());
        self.medications.len() - 1
    }

    /// Remove a row. The last remaining row cannot be removed.
    pub fn remove_medication(&mut self, index: usize) -> bool {
        if self.medications.len() <= 1 || index >= self.medications.len() {
            return false;
        }
        self.medications.remove(index);
        true
    }

    /// Indexes of rows that are not ready, with their missing fields.
    pub fn incomplete_rows(&self) -> Vec<(usize, Vec<MedicationField>)> {
        self.medications
            .iter()
            .enumerate()
            .map(|(i, m)| (i, m.missing_fields()))
            .filter(|(_, missing)| !missing.is_empty())
            .collect()
    }
}

impl IntakeForm for PrescriptionForm {
    type Payload = PrescriptionPayload;

    const ENDPOINT: IntakeEndpoint = IntakeEndpoint::Prescription;
    const MESSAGES: FormMessages = FormMessages {
        incomplete: messages::PRESCRIPTION_INCOMPLETE,
        succeeded: messages::PRESCRIPTION_SENT,
        rejected: messages::PRESCRIPTION_FAILED,
    };

    /// Every row must be ready. The patient is not required: an unknown patient is sent
    /// with empty identity fields.
    fn is_ready(&self, _patient: Option<&NormalizedPatient>) -> bool {
        self.medications.iter().all(MedicationLineItem::is_ready)
    }

    fn build_payload(&self, patient: &NormalizedPatient) -> PrescriptionPayload {
        PrescriptionPayload {
            patient: PatientFields::from(patient),
            medications: self.medications.iter().map(MedicationLineItem::to_entry).collect(),
            observations: self.observations.clone(),
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_line() -> MedicationLineItem {
        MedicationLineItem {
            commercial_name: "Ibuprofeno".into(),
            dosage: "400mg".into(),
            pharmaceutical_form: "Comprimido".into(),
            monthly_quantity: "2".into(),
            ..Default::default()
        }
    }

    #[test]
    fn other_sentinel_requires_override_text() {
        let mut line = MedicationLineItem {
            commercial_name: "Otro".into(),
            commercial_name_other: String::new(),
            dosage: "5mg".into(),
            pharmaceutical_form: "Comprimido".into(),
            monthly_quantity: "2".into(),
            ..Default::default()
        };
        assert!(!line.is_ready());
        assert_eq!(line.missing_fields(), vec![MedicationField::CommercialNameOther]);

        line.commercial_name_other = "Droga X".into();
        assert!(line.is_ready());
        assert_eq!(line.resolved_commercial_name(), "Droga X");
    }

    #[test]
    fn pharmaceutical_form_override_must_not_be_blank() {
        let mut line = ready_line();
        line.pharmaceutical_form = "Otro".into();
        line.pharmaceutical_form_other = "   ".into();
        assert_eq!(
            line.missing_fields(),
            vec![MedicationField::PharmaceuticalFormOther]
        );

        line.pharmaceutical_form_other = "Polvo".into();
        assert!(line.is_ready());
        assert_eq!(line.to_entry().pharmaceutical_form, "Polvo");
    }

    #[test]
    fn override_text_is_ignored_when_catalog_value_chosen() {
        let mut line = ready_line();
        line.commercial_name_other = "Stale text".into();
        assert_eq!(line.to_entry().commercial_name, "Ibuprofeno");
    }

    #[test]
    fn generic_name_is_optional() {
        let line = ready_line();
        assert!(line.generic_name.is_empty());
        assert!(line.is_ready());
    }

    #[test]
    fn readiness_is_false_iff_some_required_field_is_empty() {
        let clear: [fn(&mut MedicationLineItem); 4] = [
            |m| m.commercial_name.clear(),
            |m| m.dosage.clear(),
            |m| m.pharmaceutical_form.clear(),
            |m| m.monthly_quantity.clear(),
        ];

        for len in 1..=4 {
            let all_ready =
                PrescriptionForm::with_medications(vec![ready_line(); len], String::new());
            assert!(all_ready.is_ready(None), "len {len}");

            for row in 0..len {
                for blank in clear {
                    let mut form = all_ready.clone();
                    blank(form.medication_mut(row).unwrap());
                    assert!(!form.is_ready(None), "len {len}, row {row}");
                    assert_eq!(form.incomplete_rows().len(), 1);
                    assert_eq!(form.incomplete_rows()[0].0, row);
                }
            }
        }
    }

    #[test]
    fn last_row_cannot_be_removed() {
        let mut form = PrescriptionForm::new();
        assert!(!form.remove_medication(0));

        let added = form.add_medication();
        assert_eq!(added, 1);
        assert!(form.remove_medication(0));
        assert_eq!(form.medications().len(), 1);
        assert!(!form.remove_medication(5));
    }

    #[test]
    fn payload_merges_patient_and_resolved_rows() {
        let mut other = ready_line();
        other.commercial_name = "Otro".into();
        other.commercial_name_other = " Droga X ".into();
        other.generic_name = "droga".into();
        let form = PrescriptionForm::with_medications(
            vec![ready_line(), other],
            "Urgente".into(),
        );
        let patient = NormalizedPatient {
            first_name: "Ana".into(),
            membership_number: "999".into(),
            ..Default::default()
        };

        let payload = form.build_payload(&patient);

        assert_eq!(payload.patient.first_name, "Ana");
        assert_eq!(payload.patient.membership_number, "999");
        assert_eq!(payload.medications.len(), 2);
        assert_eq!(payload.medications[1].commercial_name, "Droga X");
        assert_eq!(payload.medications[1].generic_name, "droga");
        assert_eq!(payload.observations, "Urgente");
    }

    #[test]
    fn reset_returns_to_single_blank_row() {
        let mut form =
            PrescriptionForm::with_medications(vec![ready_line(), ready_line()], "x".into());
        form.reset();
        assert_eq!(form, PrescriptionForm::new());
    }

    #[test]
    fn deserializes_camel_case_with_missing_optionals() {
        let form: PrescriptionForm = serde_json::from_value(serde_json::json!({
            "medications": [{
                "commercialName": "Otro",
                "commercialNameOther": "Droga X",
                "dosage": "5mg",
                "pharmaceuticalForm": "Comprimido",
                "monthlyQuantity": "2"
            }]
        }))
        .unwrap();

        assert!(form.is_ready(None));
        assert_eq!(form.observations, "");
    }

    #[test]
    fn deserialized_empty_list_keeps_one_row() {
        let form: PrescriptionForm =
            serde_json::from_value(serde_json::json!({ "medications": [] })).unwrap();
        assert_eq!(form.medications().len(), 1);
        assert!(!form.is_ready(None));
    }
}
