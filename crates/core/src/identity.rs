//! Boundary to the identity provider and the profile document store.
//!
//! Accounts and profile documents are owned by an external service. The portal only needs
//! the operations listed on [`IdentityProvider`] and [`ProfileStore`]; the in-process
//! implementations in [`crate::accounts`] and [`crate::profile_store`] back the server and
//! the tests.

use crate::profile::RawProfileRecord;
use crate::user_id::UserId;
use crate::PortalResult;

/// The authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    /// `"First Last..."`, set at registration. Older accounts may not have one.
    pub display_name: Option<String>,
}

/// Error codes the identity provider reports and the portal translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    InvalidEmail,
    UserDisabled,
    TooManyRequests,
    EmailAlreadyInUse,
    OperationNotAllowed,
    WeakPassword,
}

impl AuthErrorCode {
    const ALL: [AuthErrorCode; 8] = [
        AuthErrorCode::UserNotFound,
        AuthErrorCode::WrongPassword,
        AuthErrorCode::InvalidEmail,
        AuthErrorCode::UserDisabled,
        AuthErrorCode::TooManyRequests,
        AuthErrorCode::EmailAlreadyInUse,
        AuthErrorCode::OperationNotAllowed,
        AuthErrorCode::WeakPassword,
    ];

    /// Parse a provider code, with or without the `auth/` prefix.
    pub fn from_provider_code(code: &str) -> Option<Self> {
        let code = code.trim();
        let code = code.strip_prefix("auth/").unwrap_or(code);
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthErrorCode::UserNotFound => "user-not-found",
            AuthErrorCode::WrongPassword => "wrong-password",
            AuthErrorCode::InvalidEmail => "invalid-email",
            AuthErrorCode::UserDisabled => "user-disabled",
            AuthErrorCode::TooManyRequests => "too-many-requests",
            AuthErrorCode::EmailAlreadyInUse => "email-already-in-use",
            AuthErrorCode::OperationNotAllowed => "operation-not-allowed",
            AuthErrorCode::WeakPassword => "weak-password",
        }
    }

    /// es-AR message shown to the user.
    pub fn user_message(self) -> &'static str {
        match self {
            AuthErrorCode::UserNotFound => "No existe una cuenta con este email",
            AuthErrorCode::WrongPassword => "Contraseña incorrecta",
            AuthErrorCode::InvalidEmail => "Email inválido",
            AuthErrorCode::UserDisabled => "Esta cuenta ha sido deshabilitada",
            AuthErrorCode::TooManyRequests => "Demasiados intentos fallidos. Intenta más tarde",
            AuthErrorCode::EmailAlreadyInUse => "Ya existe una cuenta con este email",
            AuthErrorCode::OperationNotAllowed => "Operación no permitida",
            AuthErrorCode::WeakPassword => "La contraseña es muy débil",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A failure with a code the portal knows how to explain.
    #[error("identity provider rejected the request: {}", .0.as_str())]
    Known(AuthErrorCode),
    /// Anything else; only the provider's own text is available.
    #[error("identity provider error: {message}")]
    Other { code: String, message: String },
}

impl AuthError {
    /// Classify a raw provider failure.
    pub fn from_provider(code: &str, message: &str) -> Self {
        match AuthErrorCode::from_provider_code(code) {
            Some(known) => AuthError::Known(known),
            None => AuthError::Other {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// Localized message for known codes, the provider text otherwise.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Known(code) => code.user_message().to_string(),
            AuthError::Other { message, .. } if !message.trim().is_empty() => message.clone(),
            AuthError::Other { .. } => "Error desconocido".to_string(),
        }
    }

    pub fn code(&self) -> Option<AuthErrorCode> {
        match self {
            AuthError::Known(code) => Some(*code),
            AuthError::Other { .. } => None,
        }
    }
}

impl From<AuthErrorCode> for AuthError {
    fn from(code: AuthErrorCode) -> Self {
        AuthError::Known(code)
    }
}

/// Account operations offered by the identity provider.
pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    fn sign_out(&self, user: &UserId) -> Result<(), AuthError>;

    fn create_account(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    fn set_display_name(&self, user: &UserId, display_name: &str)
        -> Result<SessionUser, AuthError>;

    fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    fn update_password(&self, user: &UserId, new_password: &str) -> Result<(), AuthError>;

    /// Look up an account by id; `None` if it no longer exists.
    fn user(&self, user: &UserId) -> Option<SessionUser>;
}

/// Profile documents keyed by account id.
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the account has no profile document.
    fn read_profile(&self, user: &UserId) -> PortalResult<Option<RawProfileRecord>>;

    /// Write `fields`. With `merge` the keys are combined with any existing document;
    /// without it the document is replaced.
    fn write_profile(
        &self,
        user: &UserId,
        fields: RawProfileRecord,
        merge: bool,
    ) -> PortalResult<()>;
}
