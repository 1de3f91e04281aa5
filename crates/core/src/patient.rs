//! Patient identity reconciliation.
//!
//! The request forms need one stable set of identity fields regardless of which registration
//! form created the profile, or whether a profile exists at all. [`reconcile`] combines the
//! migrated profile with what the authenticated session knows about the user.

use crate::constants::SELF_PAY_PROVIDER;
use crate::profile::{RawProfileRecord, StoredProfile};
use serde::Serialize;

/// Identity facts available from the authenticated session, independent of the profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHints<'a> {
    pub email: Option<&'a str>,
    /// Display name of the form `"First Last..."`.
    pub display_name: Option<&'a str>,
}

impl<'a> IdentityHints<'a> {
    pub fn new(email: Option<&'a str>, display_name: Option<&'a str>) -> Self {
        Self {
            email,
            display_name,
        }
    }
}

/// Canonical patient identity consumed by every request form.
///
/// Every field is always a string; an unknown value is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPatient {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub insurance_provider: String,
    pub membership_number: String,
}

impl NormalizedPatient {
    /// One-line identity summary, e.g. `"Ana Gomez · DNI 30111222"`.
    pub fn identity_line(&self) -> String {
        format!(
            "{} {} · DNI {}",
            self.first_name, self.last_name, self.national_id
        )
    }

    /// One-line coverage summary; an empty provider reads as self-pay.
    pub fn coverage_line(&self) -> String {
        let provider = if self.insurance_provider.is_empty() {
            SELF_PAY_PROVIDER
        } else {
            &self.insurance_provider
        };

        if self.membership_number.is_empty() {
            provider.to_string()
        } else {
            format!("{provider} · Afiliado {}", self.membership_number)
        }
    }
}

/// Build a [`NormalizedPatient`] from a migrated profile and session hints.
///
/// Resolution per field, first non-empty wins:
/// - first name: profile → first display-name token
/// - last name: profile → remaining display-name tokens joined by one space
/// - email: profile → session email
/// - everything else: profile only
///
/// Anything unresolved becomes `""`.
pub fn reconcile(profile: Option<&StoredProfile>, hints: &IdentityHints<'_>) -> NormalizedPatient {
    let stored = profile.cloned().unwrap_or_default();
    let (display_first, display_rest) = split_display_name(hints.display_name);
    let session_email = hints
        .email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string);

    NormalizedPatient {
        first_name: stored.first_name.or(display_first).unwrap_or_default(),
        last_name: stored.last_name.or(display_rest).unwrap_or_default(),
        national_id: stored.national_id.unwrap_or_default(),
        email: stored.email.or(session_email).unwrap_or_default(),
        phone: stored.phone.unwrap_or_default(),
        insurance_provider: stored.insurance_provider.unwrap_or_default(),
        membership_number: stored.membership_number.unwrap_or_default(),
    }
}

/// Migrate a raw document (if any) and reconcile it in one step.
pub fn reconcile_raw(
    raw: Option<&RawProfileRecord>,
    hints: &IdentityHints<'_>,
) -> NormalizedPatient {
    let profile = raw.map(StoredProfile::migrate);
    reconcile(profile.as_ref(), hints)
}

fn split_display_name(display_name: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(name) = display_name else {
        return (None, None);
    };

    let mut tokens = name.split_whitespace();
    let first = tokens.next().map(str::to_string);
    let rest = tokens.collect::<Vec<_>>().join(" ");
    (first, (!rest.is_empty()).then_some(rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> RawProfileRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn legacy_record_with_session_email() {
        let raw = record(json!({
            "nombre": "Ana",
            "apellido": "Gomez",
            "dni": "30111222",
            "telefono": "1122334455",
            "cobertura": "OSDE",
            "numeroAfiliado": "999",
        }));

        let patient = reconcile_raw(Some(&raw), &IdentityHints::new(Some("ana@x.com"), None));

        assert_eq!(
            patient,
            NormalizedPatient {
                first_name: "Ana".into(),
                last_name: "Gomez".into(),
                national_id: "30111222".into(),
                email: "ana@x.com".into(),
                phone: "1122334455".into(),
                insurance_provider: "OSDE".into(),
                membership_number: "999".into(),
            }
        );
    }

    #[test]
    fn absent_record_uses_display_name_and_email() {
        let hints = IdentityHints::new(Some("juan@x.com"), Some("Juan Perez Lopez"));
        let patient = reconcile_raw(None, &hints);

        assert_eq!(
            patient,
            NormalizedPatient {
                first_name: "Juan".into(),
                last_name: "Perez Lopez".into(),
                national_id: String::new(),
                email: "juan@x.com".into(),
                phone: String::new(),
                insurance_provider: String::new(),
                membership_number: String::new(),
            }
        );
    }

    #[test]
    fn old_and_new_key_names_yield_identical_patients() {
        let old = record(json!({
            "nombre": "Ana", "apellido": "Gomez", "dni": "30111222",
            "telefono": "1122334455", "cobertura": "OSDE", "numeroAfiliado": "999",
        }));
        let new = record(json!({
            "firstName": "Ana", "lastName": "Gomez", "dni": "30111222",
            "phone": "1122334455", "cobertura": "OSDE", "afiliado": "999",
        }));
        let hints = IdentityHints::new(Some("ana@x.com"), Some("Someone Else"));

        assert_eq!(
            reconcile_raw(Some(&old), &hints),
            reconcile_raw(Some(&new), &hints)
        );
    }

    #[test]
    fn stored_email_wins_over_session_email() {
        let raw = record(json!({ "email": "stored@x.com" }));
        let patient = reconcile_raw(Some(&raw), &IdentityHints::new(Some("session@x.com"), None));
        assert_eq!(patient.email, "stored@x.com");
    }

    #[test]
    fn empty_record_without_hints_is_all_empty_strings() {
        let patient = reconcile_raw(Some(&RawProfileRecord::new()), &IdentityHints::default());
        assert_eq!(patient, NormalizedPatient::default());

        let json = serde_json::to_value(&patient).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 7);
        assert!(object.values().all(|v| v == &json!("")));
    }

    #[test]
    fn single_token_display_name_leaves_last_name_empty() {
        let patient = reconcile_raw(None, &IdentityHints::new(None, Some("  Cher  ")));
        assert_eq!(patient.first_name, "Cher");
        assert_eq!(patient.last_name, "");
        assert_eq!(patient.email, "");
    }

    #[test]
    fn display_name_only_fills_missing_name_parts() {
        let raw = record(json!({ "lastName": "Gomez" }));
        let patient = reconcile_raw(Some(&raw), &IdentityHints::new(None, Some("Ana Maria Gomez")));
        assert_eq!(patient.first_name, "Ana");
        assert_eq!(patient.last_name, "Gomez");
    }

    #[test]
    fn summary_lines() {
        let mut patient = NormalizedPatient {
            first_name: "Ana".into(),
            last_name: "Gomez".into(),
            national_id: "30111222".into(),
            ..Default::default()
        };
        assert_eq!(patient.identity_line(), "Ana Gomez · DNI 30111222");
        assert_eq!(patient.coverage_line(), "Particular");

        patient.insurance_provider = "OSDE".into();
        patient.membership_number = "999".into();
        assert_eq!(patient.coverage_line(), "OSDE · Afiliado 999");
    }
}
