//! # API Shared
//!
//! Shared definitions for the CMF portal APIs.
//!
//! Contains:
//! - Wire DTOs with OpenAPI schemas (`dto` module) and their conversions to core types
//! - Shared services like `HealthService`
//! - Session-token helpers
//!
//! Used by `api-rest` and the workspace's `cmf-run` binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
