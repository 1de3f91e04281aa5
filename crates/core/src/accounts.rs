//! In-process identity provider.
//!
//! Keeps accounts in memory with salted SHA-256 password digests and mirrors the
//! failure codes of the hosted provider, so every portal flow can run without it.

use crate::constants::{MAX_FAILED_SIGN_INS, MIN_PASSWORD_CHANGE_LEN};
use crate::identity::{AuthError, AuthErrorCode, IdentityProvider, SessionUser};
use crate::user_id::UserId;
use cmf_types::{EmailAddress, NonEmptyText};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: EmailAddress,
    display_name: Option<NonEmptyText>,
    salt: String,
    password_digest: String,
    disabled: bool,
    failed_sign_ins: u32,
}

impl Account {
    fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone(),
            email: self.email.to_string(),
            display_name: self.display_name.as_ref().map(NonEmptyText::to_string),
        }
    }

    fn set_password(&mut self, password: &str) {
        self.salt = Uuid::new_v4().simple().to_string();
        self.password_digest = digest(&self.salt, password);
    }

    fn password_matches(&self, password: &str) -> bool {
        digest(&self.salt, password) == self.password_digest
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<UserId, Account>>,
    reset_requests: Mutex<Vec<String>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses that asked for a password-reset email, oldest first.
    pub fn password_reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Disable or re-enable an account. Returns `false` if no account has that email.
    pub fn set_disabled(&self, email: &str, disabled: bool) -> bool {
        let Ok(email) = EmailAddress::parse(email) else {
            return false;
        };
        let mut accounts = self.accounts();
        match accounts.values_mut().find(|a| a.email == email) {
            Some(account) => {
                account.disabled = disabled;
                true
            }
            None => false,
        }
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<UserId, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_email(email: &str) -> Result<EmailAddress, AuthError> {
    EmailAddress::parse(email).map_err(|_| AuthErrorCode::InvalidEmail.into())
}

fn check_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_CHANGE_LEN {
        return Err(AuthErrorCode::WeakPassword.into());
    }
    Ok(())
}

impl IdentityProvider for MemoryIdentity {
    fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = parse_email(email)?;
        let mut accounts = self.accounts();
        let account = accounts
            .values_mut()
            .find(|a| a.email == email)
            .ok_or(AuthError::Known(AuthErrorCode::UserNotFound))?;

        if account.disabled {
            return Err(AuthErrorCode::UserDisabled.into());
        }
        if account.failed_sign_ins >= MAX_FAILED_SIGN_INS {
            tracing::warn!(user = %account.id, "sign-in throttled");
            return Err(AuthErrorCode::TooManyRequests.into());
        }
        if !account.password_matches(password) {
            account.failed_sign_ins += 1;
            return Err(AuthErrorCode::WrongPassword.into());
        }

        account.failed_sign_ins = 0;
        tracing::info!(user = %account.id, "signed in");
        Ok(account.session_user())
    }

    fn sign_out(&self, user: &UserId) -> Result<(), AuthError> {
        if !self.accounts().contains_key(user) {
            return Err(AuthErrorCode::UserNotFound.into());
        }
        tracing::info!(user = %user, "signed out");
        Ok(())
    }

    fn create_account(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = parse_email(email)?;
        check_strength(password)?;

        let mut accounts = self.accounts();
        if accounts.values().any(|a| a.email == email) {
            return Err(AuthErrorCode::EmailAlreadyInUse.into());
        }

        let mut account = Account {
            id: UserId::new(),
            email,
            display_name: None,
            salt: String::new(),
            password_digest: String::new(),
            disabled: false,
            failed_sign_ins: 0,
        };
        account.set_password(password);

        let user = account.session_user();
        accounts.insert(account.id.clone(), account);
        tracing::info!(user = %user.id, "account created");
        Ok(user)
    }

    fn set_display_name(
        &self,
        user: &UserId,
        display_name: &str,
    ) -> Result<SessionUser, AuthError> {
        let mut accounts = self.accounts();
        let account = accounts
            .get_mut(user)
            .ok_or(AuthError::Known(AuthErrorCode::UserNotFound))?;
        account.display_name = NonEmptyText::optional(display_name);
        Ok(account.session_user())
    }

    fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = parse_email(email)?;
        if !self.accounts().values().any(|a| a.email == email) {
            return Err(AuthErrorCode::UserNotFound.into());
        }
        self.reset_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.to_string());
        Ok(())
    }

    fn update_password(&self, user: &UserId, new_password: &str) -> Result<(), AuthError> {
        check_strength(new_password)?;
        let mut accounts = self.accounts();
        let account = accounts
            .get_mut(user)
            .ok_or(AuthError::Known(AuthErrorCode::UserNotFound))?;
        account.set_password(new_password);
        account.failed_sign_ins = 0;
        tracing::info!(user = %user, "password updated");
        Ok(())
    }

    fn user(&self, user: &UserId) -> Option<SessionUser> {
        self.accounts().get(user).map(Account::session_user)
    }
}
