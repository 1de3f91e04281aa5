//! Request and response bodies of the portal API.
//!
//! Field names are camelCase on the wire. Conversions to and from `cmf_core` types live
//! next to each DTO so handlers stay thin.

use cmf_core::appointment::AppointmentForm;
use cmf_core::catalog::Catalogs;
use cmf_core::faq::FaqEntry;
use cmf_core::identity::SessionUser;
use cmf_core::prescription::{MedicationLineItem, PrescriptionForm};
use cmf_core::profile_edit::{PasswordChange, ProfileEditForm};
use cmf_core::registration::RegistrationForm;
use cmf_core::settings::{PreferenceUpdate, Preferences, TextScale};
use cmf_core::submission::{FailureReason, RequestState, SubmitReport};
use cmf_core::{NormalizedPatient, SignedIn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

/// Body of responses that only carry a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRes {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<&SessionUser> for UserRes {
    fn from(user: &SessionUser) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionRes {
    pub token: String,
    pub user: UserRes,
}

impl From<SignedIn> for SessionRes {
    fn from(signed_in: SignedIn) -> Self {
        Self {
            user: UserRes::from(&signed_in.user),
            token: signed_in.token,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub phone: String,
    pub insurance_provider: String,
    #[serde(default)]
    pub membership_number: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterReq> for RegistrationForm {
    fn from(req: RegisterReq) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            national_id: req.national_id,
            birth_date: req.birth_date,
            phone: req.phone,
            insurance_provider: req.insurance_provider,
            membership_number: req.membership_number,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordResetReq {
    #[serde(default)]
    pub email: String,
}

/// Profile page fields, used for both reading and saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDto {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub insurance_provider: String,
    pub membership_number: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
}

impl From<ProfileEditForm> for ProfileDto {
    fn from(form: ProfileEditForm) -> Self {
        Self {
            first_name: form.first_name,
            last_name: form.last_name,
            national_id: form.national_id,
            email: form.email,
            phone: form.phone,
            insurance_provider: form.insurance_provider,
            membership_number: form.membership_number,
            emergency_contact_name: form.emergency_contact_name,
            emergency_contact_phone: form.emergency_contact_phone,
        }
    }
}

impl From<ProfileDto> for ProfileEditForm {
    fn from(dto: ProfileDto) -> Self {
        Self {
            first_name: dto.first_name,
            last_name: dto.last_name,
            national_id: dto.national_id,
            email: dto.email,
            phone: dto.phone,
            insurance_provider: dto.insurance_provider,
            membership_number: dto.membership_number,
            emergency_contact_name: dto.emergency_contact_name,
            emergency_contact_phone: dto.emergency_contact_phone,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordChangeReq {
    pub new_password: String,
    pub confirm_password: String,
}

impl From<PasswordChangeReq> for PasswordChange {
    fn from(req: PasswordChangeReq) -> Self {
        Self {
            new_password: req.new_password,
            confirm_password: req.confirm_password,
        }
    }
}

/// Normalized patient identity used by the request forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRes {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub insurance_provider: String,
    pub membership_number: String,
    /// e.g. `"Ana Gomez · DNI 30111222"`
    pub identity_line: String,
    /// e.g. `"OSDE · Afiliado 999"`
    pub coverage_line: String,
}

impl From<&NormalizedPatient> for PatientRes {
    fn from(patient: &NormalizedPatient) -> Self {
        Self {
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            national_id: patient.national_id.clone(),
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            insurance_provider: patient.insurance_provider.clone(),
            membership_number: patient.membership_number.clone(),
            identity_line: patient.identity_line(),
            coverage_line: patient.coverage_line(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationReq {
    pub generic_name: String,
    /// Catalog value, or `"Otro"` with `commercial_name_other` set.
    pub commercial_name: String,
    pub commercial_name_other: String,
    pub dosage: String,
    /// Catalog value, or `"Otro"` with `pharmaceutical_form_other` set.
    pub pharmaceutical_form: String,
    pub pharmaceutical_form_other: String,
    pub monthly_quantity: String,
}

impl From<MedicationReq> for MedicationLineItem {
    fn from(req: MedicationReq) -> Self {
        Self {
            generic_name: req.generic_name,
            commercial_name: req.commercial_name,
            commercial_name_other: req.commercial_name_other,
            dosage: req.dosage,
            pharmaceutical_form: req.pharmaceutical_form,
            pharmaceutical_form_other: req.pharmaceutical_form_other,
            monthly_quantity: req.monthly_quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PrescriptionReq {
    pub medications: Vec<MedicationReq>,
    pub observations: String,
}

impl From<PrescriptionReq> for PrescriptionForm {
    fn from(req: PrescriptionReq) -> Self {
        PrescriptionForm::with_medications(
            req.medications.into_iter().map(Into::into).collect(),
            req.observations,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentReq {
    pub specialty: String,
    /// `YYYY-MM-DD`
    pub preferred_date: String,
    pub preferred_timeslot: String,
    pub comments: String,
}

impl From<AppointmentReq> for AppointmentForm {
    fn from(req: AppointmentReq) -> Self {
        Self {
            specialty: req.specialty,
            preferred_date: req.preferred_date,
            preferred_timeslot: req.preferred_timeslot,
            comments: req.comments,
        }
    }
}

/// Outcome of a prescription or appointment submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRes {
    /// `idle`, `submitting`, `succeeded` or `failed`
    pub state: String,
    /// `incomplete`, `rejected` or `transport` when `state` is `failed`
    pub reason: Option<String>,
    /// Status returned by the intake API when it rejected the request
    pub upstream_status: Option<u16>,
    pub message: String,
}

impl From<SubmitReport> for SubmitRes {
    fn from(report: SubmitReport) -> Self {
        let (state, reason, upstream_status) = match report.state {
            RequestState::Idle => ("idle", None, None),
            RequestState::Submitting => ("submitting", None, None),
            RequestState::Succeeded => ("succeeded", None, None),
            RequestState::Failed(FailureReason::Incomplete) => ("failed", Some("incomplete"), None),
            RequestState::Failed(FailureReason::Rejected { status }) => {
                ("failed", Some("rejected"), Some(status))
            }
            RequestState::Failed(FailureReason::Transport) => ("failed", Some("transport"), None),
        };
        Self {
            state: state.to_string(),
            reason: reason.map(str::to_string),
            upstream_status,
            message: report.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogsRes {
    pub medications: Vec<String>,
    pub pharmaceutical_forms: Vec<String>,
    pub specialties: Vec<String>,
    pub time_slots: Vec<String>,
    pub insurance_providers: Vec<String>,
    pub text_scales: Vec<u16>,
}

fn owned(values: Vec<&'static str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

impl From<Catalogs> for CatalogsRes {
    fn from(catalogs: Catalogs) -> Self {
        Self {
            medications: owned(catalogs.medications),
            pharmaceutical_forms: owned(catalogs.pharmaceutical_forms),
            specialties: owned(catalogs.specialties),
            time_slots: owned(catalogs.time_slots),
            insurance_providers: owned(catalogs.insurance_providers),
            text_scales: catalogs.text_scales,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FaqEntryRes {
    pub question: String,
    pub answer: String,
}

impl From<&FaqEntry> for FaqEntryRes {
    fn from(entry: &FaqEntry) -> Self {
        Self {
            question: entry.question.to_string(),
            answer: entry.answer.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FaqRes {
    pub entries: Vec<FaqEntryRes>,
}

/// Current accessibility preferences and the body classes they imply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRes {
    /// 100, 115, 130 or 150
    pub text_scale: u16,
    pub high_contrast: bool,
    pub dark_mode: bool,
    pub voice_assist: bool,
    pub body_classes: Vec<String>,
}

impl From<Preferences> for SettingsRes {
    fn from(prefs: Preferences) -> Self {
        Self {
            text_scale: prefs.text_scale.percent(),
            high_contrast: prefs.high_contrast,
            dark_mode: prefs.dark_mode,
            voice_assist: prefs.voice_assist,
            body_classes: prefs.body_classes(),
        }
    }
}

/// Partial settings change; omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdateReq {
    pub text_scale: Option<u16>,
    pub high_contrast: Option<bool>,
    pub dark_mode: Option<bool>,
    pub voice_assist: Option<bool>,
}

impl TryFrom<SettingsUpdateReq> for PreferenceUpdate {
    type Error = String;

    fn try_from(req: SettingsUpdateReq) -> Result<Self, Self::Error> {
        Ok(Self {
            text_scale: req.text_scale.map(TextScale::try_from).transpose()?,
            high_contrast: req.high_contrast,
            dark_mode: req.dark_mode,
            voice_assist: req.voice_assist,
        })
    }
}
