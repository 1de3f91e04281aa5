//! Account registration form.
//!
//! Validation runs locally before the identity provider is contacted. A valid form yields
//! the display name and the generation-2 profile document written for the new account.

use crate::constants::{MIN_REGISTRATION_PASSWORD_LEN, SELF_PAY_PROVIDER};
use crate::identity::AuthError;
use crate::profile::RawProfileRecord;
use crate::PortalError;
use chrono::{DateTime, NaiveDate, Utc};
use cmf_types::{is_blank, NationalId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub phone: String,
    pub insurance_provider: String,
    /// Not required for self-paying patients.
    pub membership_number: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("password does not meet the strength rules")]
    WeakPassword,
    #[error("required fields are missing")]
    MissingFields,
    #[error("membership number is required for insured patients")]
    MissingMembershipNumber,
    #[error("national id must have 7 or 8 digits")]
    InvalidNationalId,
    #[error("birth date must be YYYY-MM-DD")]
    InvalidBirthDate,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("failed to store profile: {0}")]
    Store(#[from] PortalError),
}

impl RegistrationError {
    pub fn user_message(&self) -> String {
        match self {
            RegistrationError::WeakPassword => {
                "La contraseña debe tener al menos 8 caracteres, una mayúscula, un número y un símbolo."
                    .to_string()
            }
            RegistrationError::MissingFields => "Completá todos los campos requeridos".to_string(),
            RegistrationError::MissingMembershipNumber => "Ingresá tu N° de afiliado".to_string(),
            RegistrationError::InvalidNationalId => "El DNI debe tener 7 u 8 dígitos".to_string(),
            RegistrationError::InvalidBirthDate => {
                "Ingresá una fecha de nacimiento válida".to_string()
            }
            RegistrationError::Auth(err) => err.user_message(),
            RegistrationError::Store(_) => "Error al crear la cuenta".to_string(),
        }
    }
}

/// At least 8 characters with an uppercase letter (accented capitals and `Ñ` count), a
/// digit, and a character outside `A-Za-z0-9`.
pub fn password_is_strong(password: &str) -> bool {
    password.chars().count() >= MIN_REGISTRATION_PASSWORD_LEN
        && password
            .chars()
            .any(|c| c.is_ascii_uppercase() || "ÁÉÍÓÚÑ".contains(c))
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_ascii_alphanumeric())
}

impl RegistrationForm {
    /// Check the form in the order the user is told about problems.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if !password_is_strong(&self.password) {
            return Err(RegistrationError::WeakPassword);
        }

        let required = [
            &self.first_name,
            &self.last_name,
            &self.national_id,
            &self.birth_date,
            &self.phone,
            &self.insurance_provider,
            &self.email,
        ];
        if required.iter().any(|v| is_blank(v)) {
            return Err(RegistrationError::MissingFields);
        }

        if self.insurance_provider.trim() != SELF_PAY_PROVIDER && is_blank(&self.membership_number)
        {
            return Err(RegistrationError::MissingMembershipNumber);
        }

        NationalId::parse(&self.national_id).map_err(|_| RegistrationError::InvalidNationalId)?;
        NaiveDate::parse_from_str(self.birth_date.trim(), "%Y-%m-%d")
            .map_err(|_| RegistrationError::InvalidBirthDate)?;

        Ok(())
    }

    /// `"First Last"` as stored on the account.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Profile document for the new account, using generation-2 key names.
    ///
    /// `afiliado` is `null` when no membership number was given.
    pub fn profile_fields(&self, created_at: DateTime<Utc>) -> RawProfileRecord {
        let text = |s: &str| Value::String(s.trim().to_string());
        let national_id = NationalId::parse(&self.national_id)
            .map(|id| id.to_string())
            .unwrap_or_else(|_| self.national_id.trim().to_string());

        let mut doc = RawProfileRecord::new();
        doc.insert("firstName".into(), text(&self.first_name));
        doc.insert("lastName".into(), text(&self.last_name));
        doc.insert("dni".into(), Value::String(national_id));
        doc.insert("birthDate".into(), text(&self.birth_date));
        doc.insert("phone".into(), text(&self.phone));
        doc.insert("cobertura".into(), text(&self.insurance_provider));
        doc.insert(
            "afiliado".into(),
            if is_blank(&self.membership_number) {
                Value::Null
            } else {
                text(&self.membership_number)
            },
        );
        doc.insert("email".into(), Value::String(self.email.trim().to_lowercase()));
        doc.insert("createdAt".into(), Value::String(created_at.to_rfc3339()));
        doc
    }
}
