//! Validated text types shared across the CMF portal crates.
//!
//! Form input arrives as loose strings. These wrappers are the points where a string is
//! promoted to something downstream code may rely on: [`NonEmptyText`] for required fields,
//! [`NationalId`] for the DNI and [`EmailAddress`] for account identifiers.

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a 7 or 8 digit national identity number
    #[error("National id must have 7 or 8 digits")]
    InvalidNationalId,
    /// The input did not look like an email address
    #[error("Invalid email address")]
    InvalidEmail,
}

/// Returns `true` when `input` has no non-whitespace characters.
pub fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}

/// A string that holds at least one non-whitespace character.
///
/// Construction trims surrounding whitespace, so `"  Ana "` becomes `"Ana"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it, rejecting blank values with [`TextError::Empty`].
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`] but maps blank input to `None` instead of an error.
    pub fn optional(input: impl AsRef<str>) -> Option<Self> {
        Self::new(input).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Argentine national identity number (DNI).
///
/// Only ASCII digits are accepted and the length must be 7 or 8. Dots used as thousands
/// separators (`30.111.222`) are stripped before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NationalId(String);

impl NationalId {
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let digits: String = input.trim().chars().filter(|c| *c != '.').collect();
        if digits.is_empty() {
            return Err(TextError::Empty);
        }
        let valid = (7..=8).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit());
        if !valid {
            return Err(TextError::InvalidNationalId);
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NationalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address normalised to lowercase.
///
/// The check is intentionally shallow: one `@`, a non-empty local part and a dotted domain.
/// Deliverability is the identity provider's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let mut parts = trimmed.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TextError::InvalidEmail);
        };

        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains(char::is_whitespace);
        if local.is_empty() || local.contains(char::is_whitespace) || !domain_ok {
            return Err(TextError::InvalidEmail);
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Ana ").unwrap().as_str(), "Ana");
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert!(NonEmptyText::optional("").is_none());
    }

    #[test]
    fn national_id_accepts_seven_or_eight_digits() {
        assert_eq!(NationalId::parse("30111222").unwrap().as_str(), "30111222");
        assert_eq!(NationalId::parse("3.011.122").unwrap().as_str(), "3011122");
        assert_eq!(NationalId::parse("123456"), Err(TextError::InvalidNationalId));
        assert_eq!(NationalId::parse("123456789"), Err(TextError::InvalidNationalId));
        assert_eq!(NationalId::parse("30A11222"), Err(TextError::InvalidNationalId));
        assert_eq!(NationalId::parse(""), Err(TextError::Empty));
    }

    #[test]
    fn email_address_is_lowercased() {
        let email = EmailAddress::parse(" Ana@X.com ").unwrap();
        assert_eq!(email.as_str(), "ana@x.com");
    }

    #[test]
    fn email_address_rejects_malformed_input() {
        for bad in ["ana", "ana@", "@x.com", "ana@x", "a@b@c.com", "ana maria@x.com"] {
            assert_eq!(EmailAddress::parse(bad), Err(TextError::InvalidEmail), "{bad}");
        }
    }
}
