//! Account and profile flows tied to a bearer session.
//!
//! [`PortalService`] combines the identity provider, the profile store and the session
//! registry. Every operation that needs a signed-in user takes the resolved
//! [`SessionUser`]; resolving the token is the caller's first step.

use crate::constants::{messages, DEFAULT_SESSION_IDLE_SECS};
use crate::identity::{IdentityProvider, ProfileStore, SessionUser};
use crate::patient::{reconcile, IdentityHints, NormalizedPatient};
use crate::profile::StoredProfile;
use crate::profile_edit::{PasswordChange, ProfileEditForm};
use crate::registration::{RegistrationError, RegistrationForm};
use crate::session::SessionRegistry;
use crate::{PortalError, PortalResult};
use chrono::Utc;
use cmf_types::is_blank;
use std::sync::Arc;
use std::time::Duration;

/// A signed-in user together with the bearer token for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Clone)]
pub struct PortalService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    sessions: Arc<SessionRegistry>,
}

impl PortalService {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self::with_session_idle_timeout(
            identity,
            profiles,
            Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        )
    }

    /// Like [`Self::new`], with sessions ending after `idle_timeout` without use.
    pub fn with_session_idle_timeout(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            profiles,
            sessions: Arc::new(SessionRegistry::with_idle_timeout(idle_timeout)),
        }
    }

    pub fn login(&self, email: &str, password: &str) -> PortalResult<SignedIn> {
        let user = self.identity.sign_in(email, password)?;
        let token = self.sessions.issue(&user.id);
        Ok(SignedIn { token, user })
    }

    /// End the session behind `token`.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::NotAuthenticated` if the token is unknown.
    pub fn logout(&self, token: &str) -> PortalResult<()> {
        let session = self
            .sessions
            .revoke(token)
            .ok_or(PortalError::NotAuthenticated)?;
        self.identity.sign_out(&session.user)?;
        Ok(())
    }

    /// The account behind `token`, if the session and the account both still exist.
    pub fn current_user(&self, token: &str) -> PortalResult<SessionUser> {
        let session = self
            .sessions
            .resolve(token)
            .ok_or(PortalError::NotAuthenticated)?;
        self.identity
            .user(&session.user)
            .ok_or(PortalError::NotAuthenticated)
    }

    /// Whether `token` still names a live session. Does not extend it.
    pub fn session_active(&self, token: &str) -> bool {
        self.sessions.is_active(token)
    }

    /// Drop sessions idle past the timeout.
    pub fn prune_sessions(&self) -> usize {
        let pruned = self.sessions.prune_expired();
        if pruned > 0 {
            tracing::debug!(pruned, "idle sessions dropped");
        }
        pruned
    }

    /// Validate, create the account, set its display name and write its first profile
    /// document. The new account is signed in.
    pub fn register(&self, form: &RegistrationForm) -> Result<SignedIn, RegistrationError> {
        form.validate()?;

        let created = self.identity.create_account(&form.email, &form.password)?;
        let user = self
            .identity
            .set_display_name(&created.id, &form.display_name())?;
        self.profiles
            .write_profile(&user.id, form.profile_fields(Utc::now()), false)?;

        tracing::info!(user = %user.id, "registration completed");
        let token = self.sessions.issue(&user.id);
        Ok(SignedIn { token, user })
    }

    /// Ask the identity provider to email a reset link.
    pub fn reset_password(&self, email: &str) -> PortalResult<()> {
        if is_blank(email) {
            return Err(PortalError::InvalidInput(
                messages::RESET_EMAIL_REQUIRED.to_string(),
            ));
        }
        self.identity.send_password_reset(email.trim())?;
        Ok(())
    }

    fn stored_profile(&self, user: &SessionUser) -> PortalResult<Option<StoredProfile>> {
        let raw = self.profiles.read_profile(&user.id)?;
        if let Some(raw) = &raw {
            tracing::debug!(
                user = %user.id,
                generation = ?StoredProfile::detect_generation(raw),
                "profile document read"
            );
        }
        Ok(raw.as_ref().map(StoredProfile::migrate))
    }

    /// Normalized identity for the request forms.
    ///
    /// A profile that cannot be read is treated like a missing one, so the forms still get
    /// whatever the session knows.
    pub fn load_patient(&self, user: &SessionUser) -> NormalizedPatient {
        let profile = self.stored_profile(user).unwrap_or_else(|e| {
            tracing::warn!(user = %user.id, error = %e, "profile read failed");
            None
        });
        let hints = IdentityHints::new(Some(&user.email), user.display_name.as_deref());
        reconcile(profile.as_ref(), &hints)
    }

    pub fn load_profile(&self, user: &SessionUser) -> PortalResult<ProfileEditForm> {
        let profile = self.stored_profile(user)?;
        Ok(ProfileEditForm::load(profile.as_ref(), Some(&user.email)))
    }

    pub fn save_profile(&self, user: &SessionUser, form: &ProfileEditForm) -> PortalResult<()> {
        self.profiles
            .write_profile(&user.id, form.to_fields(Utc::now()), true)?;
        tracing::info!(user = %user.id, "profile saved");
        Ok(())
    }

    pub fn change_password(&self, user: &SessionUser, change: &PasswordChange) -> PortalResult<()> {
        let new_password = change
            .validate()
            .map_err(|e| PortalError::InvalidInput(e.user_message().to_string()))?;
        self.identity.update_password(&user.id, new_password)?;
        Ok(())
    }
}
