//! # CMF Core
//!
//! Core logic for the CMF patient portal.
//!
//! This crate owns everything between a signed-in patient and the external services:
//! - Profile documents: schema migration ([`profile`]) and reconciliation into a
//!   [`NormalizedPatient`] ([`patient`])
//! - Prescription and appointment request forms and their submission lifecycle
//! - The HTTP client for the request-intake API
//! - Accounts, sessions, registration and profile editing behind the
//!   [`identity::IdentityProvider`] and [`identity::ProfileStore`] boundaries
//! - Accessibility preferences with change broadcasting
//!
//! **No API concerns**: HTTP servers and wire DTOs belong in `api-rest` and `api-shared`.

pub mod accounts;
pub mod appointment;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod faq;
pub mod identity;
pub mod intake;
pub mod patient;
pub mod payload;
pub mod portal;
pub mod prescription;
pub mod profile;
pub mod profile_edit;
pub mod profile_store;
pub mod registration;
pub mod session;
pub mod settings;
pub mod submission;
pub mod user_id;

pub use config::CoreConfig;
pub use error::{PortalError, PortalResult};
pub use patient::{reconcile, reconcile_raw, IdentityHints, NormalizedPatient};
pub use portal::{PortalService, SignedIn};
pub use user_id::UserId;
