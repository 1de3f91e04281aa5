//! Profile page: editable profile fields and password change.
//!
//! The page reads through the same migration as the request forms but saves with the
//! generation-1 key names, merged into the existing document.

use crate::constants::MIN_PASSWORD_CHANGE_LEN;
use crate::constants::messages;
use crate::profile::{RawProfileRecord, StoredProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileEditForm {
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

impl ProfileEditForm {
    /// Populate the page. Names are never derived from the display name here; only the
    /// email falls back to the session's address.
    pub fn load(profile: Option<&StoredProfile>, session_email: Option<&str>) -> Self {
        let stored = profile.cloned().unwrap_or_default();
        let session_email = session_email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        Self {
            first_name: stored.first_name.unwrap_or_default(),
            last_name: stored.last_name.unwrap_or_default(),
            national_id: stored.national_id.unwrap_or_default(),
            email: stored.email.or(session_email).unwrap_or_default(),
            phone: stored.phone.unwrap_or_default(),
            insurance_provider: stored.insurance_provider.unwrap_or_default(),
            membership_number: stored.membership_number.unwrap_or_default(),
            emergency_contact_name: stored.emergency_contact_name.unwrap_or_default(),
            emergency_contact_phone: stored.emergency_contact_phone.unwrap_or_default(),
        }
    }

    /// Fields written on save, to be merged into the stored document.
    pub fn to_fields(&self, updated_at: DateTime<Utc>) -> RawProfileRecord {
        let entries = [
            ("nombre", &self.first_name),
            ("apellido", &self.last_name),
            ("dni", &self.national_id),
            ("email", &self.email),
            ("telefono", &self.phone),
            ("cobertura", &self.insurance_provider),
            ("numeroAfiliado", &self.membership_number),
            ("emergenciaNombre", &self.emergency_contact_name),
            ("emergenciaTelefono", &self.emergency_contact_phone),
        ];

        let mut doc: RawProfileRecord = entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
            .collect();
        doc.insert("updatedAt".into(), Value::String(updated_at.to_rfc3339()));
        doc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordChangeError {
    #[error("passwords do not match")]
    Mismatch,
    #[error("password is too short")]
    TooShort,
}

impl PasswordChangeError {
    pub fn user_message(self) -> &'static str {
        match self {
            PasswordChangeError::Mismatch => messages::PASSWORDS_DO_NOT_MATCH,
            PasswordChangeError::TooShort => messages::PASSWORD_CHANGE_TOO_SHORT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordChange {
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    /// Entries must match; then the length rule applies.
    pub fn validate(&self) -> Result<&str, PasswordChangeError> {
        if self.new_password != self.confirm_password {
            return Err(PasswordChangeError::Mismatch);
        }
        if self.new_password.chars().count() < MIN_PASSWORD_CHANGE_LEN {
            return Err(PasswordChangeError::TooShort);
        }
        Ok(&self.new_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SchemaGeneration;
    use serde_json::json;

    #[test]
    fn load_reads_current_generation_and_falls_back_to_session_email() {
        let raw = match json!({ "firstName": "Ana", "afiliado": "999", "emergenciaNombre": "Luis" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let profile = StoredProfile::migrate(&raw);

        let form = ProfileEditForm::load(Some(&profile), Some("ana@x.com"));

        assert_eq!(form.first_name, "Ana");
        assert_eq!(form.membership_number, "999");
        assert_eq!(form.emergency_contact_name, "Luis");
        assert_eq!(form.email, "ana@x.com");
    }

    #[test]
    fn absent_profile_only_fills_email() {
        let form = ProfileEditForm::load(None, Some("ana@x.com"));
        assert_eq!(
            form,
            ProfileEditForm {
                email: "ana@x.com".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn save_uses_legacy_keys_with_timestamp() {
        let form = ProfileEditForm {
            first_name: "Ana".into(),
            phone: "1122334455".into(),
            ..Default::default()
        };
        let doc = form.to_fields(Utc::now());

        assert_eq!(doc["nombre"], "Ana");
        assert_eq!(doc["telefono"], "1122334455");
        assert_eq!(doc["emergenciaTelefono"], "");
        assert!(doc.contains_key("updatedAt"));
        assert_eq!(StoredProfile::detect_generation(&doc), SchemaGeneration::Legacy);
    }

    #[test]
    fn password_change_rules() {
        let change = |a: &str, b: &str| PasswordChange {
            new_password: a.into(),
            confirm_password: b.into(),
        };

        assert_eq!(change("abcdef", "abcdeg").validate(), Err(PasswordChangeError::Mismatch));
        assert_eq!(change("abc", "abc").validate(), Err(PasswordChangeError::TooShort));
        assert_eq!(change("abcdef", "abcdef").validate(), Ok("abcdef"));
        assert_eq!(
            PasswordChangeError::Mismatch.user_message(),
            "Las contraseñas no coinciden"
        );
    }
}
