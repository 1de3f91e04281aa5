//! Stored profile documents and their schema migration.
//!
//! Profiles live in the document store as untyped JSON objects. Two generations of the
//! registration form wrote them with different key names:
//!
//! | field | generation 1 (legacy) | generation 2 (current) |
//! |---|---|---|
//! | first name | `nombre` | `firstName` |
//! | last name | `apellido` | `lastName` |
//! | phone | `telefono` | `phone` |
//! | membership number | `numeroAfiliado` | `afiliado` |
//! | birth date | `fechaNacimiento` | `birthDate` |
//!
//! `dni`, `email`, `cobertura`, `emergenciaNombre` and `emergenciaTelefono` are shared by
//! both. [`StoredProfile::migrate`] is applied once when a document is read and is the only
//! place that knows about these names; everything downstream works with [`StoredProfile`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A profile document exactly as returned by the document store.
pub type RawProfileRecord = serde_json::Map<String, Value>;

/// Which key-name generation a raw document was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaGeneration {
    /// No generation-specific key carries a value.
    Empty,
    Legacy,
    Current,
    /// Keys from both generations carry values, typically a registration later edited
    /// from the profile page.
    Mixed,
}

/// One logical field and the keys it may be stored under, in resolution order.
struct FieldKeys {
    legacy: &'static str,
    current: Option<&'static str>,
}

impl FieldKeys {
    const fn shared(key: &'static str) -> Self {
        Self {
            legacy: key,
            current: None,
        }
    }

    const fn renamed(legacy: &'static str, current: &'static str) -> Self {
        Self {
            legacy,
            current: Some(current),
        }
    }

    fn resolve(&self, raw: &RawProfileRecord) -> Option<String> {
        text_value(raw, self.legacy).or_else(|| self.current.and_then(|key| text_value(raw, key)))
    }
}

const FIRST_NAME: FieldKeys = FieldKeys::renamed("nombre", "firstName");
const LAST_NAME: FieldKeys = FieldKeys::renamed("apellido", "lastName");
const NATIONAL_ID: FieldKeys = FieldKeys::shared("dni");
const EMAIL: FieldKeys = FieldKeys::shared("email");
const PHONE: FieldKeys = FieldKeys::renamed("telefono", "phone");
const INSURANCE_PROVIDER: FieldKeys = FieldKeys::shared("cobertura");
const MEMBERSHIP_NUMBER: FieldKeys = FieldKeys::renamed("numeroAfiliado", "afiliado");
const BIRTH_DATE: FieldKeys = FieldKeys::renamed("fechaNacimiento", "birthDate");
const EMERGENCY_CONTACT_NAME: FieldKeys = FieldKeys::shared("emergenciaNombre");
const EMERGENCY_CONTACT_PHONE: FieldKeys = FieldKeys::shared("emergenciaTelefono");

const RENAMED_FIELDS: [&FieldKeys; 5] = [
    &FIRST_NAME,
    &LAST_NAME,
    &PHONE,
    &MEMBERSHIP_NUMBER,
    &BIRTH_DATE,
];

/// Canonical view of a stored profile. `None` means the store had no usable value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub national_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub insurance_provider: Option<String>,
    pub membership_number: Option<String>,
    pub birth_date: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl StoredProfile {
    /// Migrate a raw document of any generation into the canonical structure.
    ///
    /// For renamed fields the legacy key wins when both carry a value. Strings are trimmed,
    /// numbers are rendered as decimal text, and blank strings, `null`, booleans, arrays and
    /// objects count as absent.
    pub fn migrate(raw: &RawProfileRecord) -> Self {
        Self {
            first_name: FIRST_NAME.resolve(raw),
            last_name: LAST_NAME.resolve(raw),
            national_id: NATIONAL_ID.resolve(raw),
            email: EMAIL.resolve(raw),
            phone: PHONE.resolve(raw),
            insurance_provider: INSURANCE_PROVIDER.resolve(raw),
            membership_number: MEMBERSHIP_NUMBER.resolve(raw),
            birth_date: BIRTH_DATE.resolve(raw),
            emergency_contact_name: EMERGENCY_CONTACT_NAME.resolve(raw),
            emergency_contact_phone: EMERGENCY_CONTACT_PHONE.resolve(raw),
        }
    }

    /// Report which key generation a raw document uses.
    pub fn detect_generation(raw: &RawProfileRecord) -> SchemaGeneration {
        let legacy = RENAMED_FIELDS
            .iter()
            .any(|f| text_value(raw, f.legacy).is_some());
        let current = RENAMED_FIELDS
            .iter()
            .filter_map(|f| f.current)
            .any(|key| text_value(raw, key).is_some());

        match (legacy, current) {
            (false, false) => SchemaGeneration::Empty,
            (true, false) => SchemaGeneration::Legacy,
            (false, true) => SchemaGeneration::Current,
            (true, true) => SchemaGeneration::Mixed,
        }
    }
}

fn text_value(raw: &RawProfileRecord, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawProfileRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn legacy_and_current_documents_migrate_identically() {
        let legacy = record(json!({
            "nombre": "Ana",
            "apellido": "Gomez",
            "dni": "30111222",
            "telefono": "1122334455",
            "cobertura": "OSDE",
            "numeroAfiliado": "999",
            "fechaNacimiento": "1990-04-01",
        }));
        let current = record(json!({
            "firstName": "Ana",
            "lastName": "Gomez",
            "dni": "30111222",
            "phone": "1122334455",
            "cobertura": "OSDE",
            "afiliado": "999",
            "birthDate": "1990-04-01",
        }));

        assert_eq!(StoredProfile::migrate(&legacy), StoredProfile::migrate(&current));
        assert_eq!(
            StoredProfile::detect_generation(&legacy),
            SchemaGeneration::Legacy
        );
        assert_eq!(
            StoredProfile::detect_generation(&current),
            SchemaGeneration::Current
        );
    }

    #[test]
    fn legacy_key_wins_when_both_generations_present() {
        let raw = record(json!({ "nombre": "Ana", "firstName": "Anita" }));
        let profile = StoredProfile::migrate(&raw);

        assert_eq!(profile.first_name.as_deref(), Some("Ana"));
        assert_eq!(
            StoredProfile::detect_generation(&raw),
            SchemaGeneration::Mixed
        );
    }

    #[test]
    fn blank_legacy_value_falls_through_to_current_key() {
        let raw = record(json!({ "telefono": "  ", "phone": "1144556677" }));
        let profile = StoredProfile::migrate(&raw);

        assert_eq!(profile.phone.as_deref(), Some("1144556677"));
    }

    #[test]
    fn non_text_values_are_absent_and_numbers_are_rendered() {
        let raw = record(json!({
            "afiliado": null,
            "activo": true,
            "dni": 30111222,
            "cobertura": ["OSDE"],
            "email": { "value": "ana@x.com" },
        }));
        let profile = StoredProfile::migrate(&raw);

        assert_eq!(profile.membership_number, None);
        assert_eq!(profile.national_id.as_deref(), Some("30111222"));
        assert_eq!(profile.insurance_provider, None);
        assert_eq!(profile.email, None);
        assert_eq!(
            StoredProfile::detect_generation(&raw),
            SchemaGeneration::Empty
        );
    }

    #[test]
    fn values_are_trimmed() {
        let raw = record(json!({ "nombre": "  Ana  ", "emergenciaNombre": " Luis " }));
        let profile = StoredProfile::migrate(&raw);

        assert_eq!(profile.first_name.as_deref(), Some("Ana"));
        assert_eq!(profile.emergency_contact_name.as_deref(), Some("Luis"));
    }
}
