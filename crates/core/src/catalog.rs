//! Fixed option lists shown by the request and registration forms.

use crate::constants::{
    INSURANCE_PROVIDERS, MEDICATION_NAMES, OTHER_SENTINEL, PHARMACEUTICAL_FORMS, SPECIALTIES,
    TIME_SLOTS,
};
use crate::settings::TextScale;
use serde::Serialize;

/// Every selectable list, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogs {
    pub medications: Vec<&'static str>,
    pub pharmaceutical_forms: Vec<&'static str>,
    pub specialties: Vec<&'static str>,
    pub time_slots: Vec<&'static str>,
    pub insurance_providers: Vec<&'static str>,
    pub text_scales: Vec<u16>,
}

impl Catalogs {
    pub fn standard() -> Self {
        Self {
            medications: medication_options(),
            pharmaceutical_forms: pharmaceutical_form_options(),
            specialties: SPECIALTIES.to_vec(),
            time_slots: TIME_SLOTS.to_vec(),
            insurance_providers: INSURANCE_PROVIDERS.to_vec(),
            text_scales: TextScale::ALL.iter().map(|s| s.percent()).collect(),
        }
    }
}

/// Medication names sorted alphabetically with the sentinel appended last.
pub fn medication_options() -> Vec<&'static str> {
    let mut names = MEDICATION_NAMES.to_vec();
    names.sort_unstable();
    names.push(OTHER_SENTINEL);
    names
}

/// Pharmaceutical forms in catalog order with the sentinel appended last.
pub fn pharmaceutical_form_options() -> Vec<&'static str> {
    let mut forms = PHARMACEUTICAL_FORMS.to_vec();
    forms.push(OTHER_SENTINEL);
    forms
}

pub fn is_specialty(value: &str) -> bool {
    SPECIALTIES.contains(&value)
}

pub fn is_time_slot(value: &str) -> bool {
    TIME_SLOTS.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medications_are_sorted_with_sentinel_last() {
        let options = medication_options();
        assert_eq!(options.last(), Some(&OTHER_SENTINEL));
        assert_eq!(options.first(), Some(&"Amoxicilina"));

        let without_sentinel = &options[..options.len() - 1];
        let mut sorted = without_sentinel.to_vec();
        sorted.sort_unstable();
        assert_eq!(without_sentinel, sorted.as_slice());
        assert_eq!(options.len(), MEDICATION_NAMES.len() + 1);
    }

    #[test]
    fn pharmaceutical_forms_end_with_sentinel() {
        let forms = pharmaceutical_form_options();
        assert_eq!(forms.first(), Some(&"Comprimido"));
        assert_eq!(forms.last(), Some(&OTHER_SENTINEL));
    }

    #[test]
    fn standard_catalogs_include_self_pay_and_text_scales() {
        let catalogs = Catalogs::standard();
        assert!(catalogs.insurance_providers.contains(&"Particular"));
        assert_eq!(catalogs.text_scales, vec![100, 115, 130, 150]);
        assert!(is_specialty("Cardiología"));
        assert!(is_time_slot("08:00 - 10:00"));
        assert!(!is_time_slot("07:00 - 08:00"));
    }
}
