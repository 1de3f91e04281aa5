//! Wire bodies accepted by the intake API.
//!
//! Field names are fixed by the intake service and stay in Spanish on the wire.

use crate::patient::NormalizedPatient;
use serde::{Deserialize, Serialize};

/// Patient identity block shared by both intake bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFields {
    #[serde(rename = "nombrePaciente")]
    pub first_name: String,
    #[serde(rename = "apellidoPaciente")]
    pub last_name: String,
    #[serde(rename = "dniPaciente")]
    pub national_id: String,
    #[serde(rename = "emailPaciente")]
    pub email: String,
    #[serde(rename = "telefonoPaciente")]
    pub phone: String,
    #[serde(rename = "obraSocial")]
    pub insurance_provider: String,
    #[serde(rename = "nroAfiliado")]
    pub membership_number: String,
}

impl From<&NormalizedPatient> for PatientFields {
    fn from(patient: &NormalizedPatient) -> Self {
        Self {
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            national_id: patient.national_id.clone(),
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            insurance_provider: patient.insurance_provider.clone(),
            membership_number: patient.membership_number.clone(),
        }
    }
}

/// One medication with any "Otro" selection already replaced by its free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    #[serde(rename = "nombreGenerico")]
    pub generic_name: String,
    #[serde(rename = "nombreComercial")]
    pub commercial_name: String,
    #[serde(rename = "dosis")]
    pub dosage: String,
    #[serde(rename = "formaFarmaceutica")]
    pub pharmaceutical_form: String,
    #[serde(rename = "requerimientoMensual")]
    pub monthly_quantity: String,
}

/// Body of `POST {base}/enviar-receta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionPayload {
    #[serde(flatten)]
    pub patient: PatientFields,
    #[serde(rename = "medicamentos")]
    pub medications: Vec<MedicationEntry>,
    #[serde(rename = "observaciones")]
    pub observations: String,
}

/// Body of `POST {base}/enviar-turno`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPayload {
    #[serde(flatten)]
    pub patient: PatientFields,
    #[serde(rename = "tipoConsulta")]
    pub specialty: String,
    #[serde(rename = "fechaPreferida")]
    pub preferred_date: String,
    #[serde(rename = "horarioPreferido")]
    pub preferred_timeslot: String,
    #[serde(rename = "comentarios")]
    pub comments: String,
}
