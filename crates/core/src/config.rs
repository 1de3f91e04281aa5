//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services, so
//! request handling never reads process-wide environment variables.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_NOTICE_SECS, PREFERENCES_JSON_FILENAME, PROFILES_DIR_NAME,
};
use crate::{PortalError, PortalResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    intake_base_url: String,
    data_dir: PathBuf,
    intake_timeout: Option<Duration>,
    notice_window: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The intake base URL must be an absolute `http`/`https` URL; a trailing `/` is removed so
    /// endpoint paths can be appended with a single separator.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidConfig` if the base URL is blank or not http(s), or if the
    /// notice window is zero.
    pub fn new(
        intake_base_url: &str,
        data_dir: PathBuf,
        intake_timeout: Option<Duration>,
        notice_window: Duration,
    ) -> PortalResult<Self> {
        let trimmed = intake_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(PortalError::InvalidConfig(
                "intake base URL cannot be empty".into(),
            ));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(PortalError::InvalidConfig(format!(
                "intake base URL must start with http:// or https:// (got {trimmed})"
            )));
        }
        if notice_window.is_zero() {
            return Err(PortalError::InvalidConfig(
                "notice window must be greater than zero".into(),
            ));
        }

        Ok(Self {
            intake_base_url: trimmed.to_string(),
            data_dir,
            intake_timeout,
            notice_window,
        })
    }

    /// Build the configuration from raw environment values, applying defaults.
    ///
    /// Takes the values of `CMF_INTAKE_BASE_URL`, `CMF_DATA_DIR`, `CMF_INTAKE_TIMEOUT_SECS` and
    /// `CMF_NOTICE_SECS` in that order.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidConfig` if the base URL is missing or invalid, or a seconds
    /// value is not a whole number.
    pub fn from_env_values(
        intake_base_url: Option<String>,
        data_dir: Option<String>,
        intake_timeout: Option<String>,
        notice_window: Option<String>,
    ) -> PortalResult<Self> {
        let intake_base_url = intake_base_url.ok_or_else(|| {
            PortalError::InvalidConfig("CMF_INTAKE_BASE_URL is not set".into())
        })?;
        let data_dir = data_dir
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.into());

        Self::new(
            &intake_base_url,
            PathBuf::from(data_dir),
            seconds_from_env_value("CMF_INTAKE_TIMEOUT_SECS", intake_timeout)?,
            notice_window_from_env_value(notice_window)?,
        )
    }

    pub fn intake_base_url(&self) -> &str {
        &self.intake_base_url
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join(PROFILES_DIR_NAME)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_JSON_FILENAME)
    }

    pub fn intake_timeout(&self) -> Option<Duration> {
        self.intake_timeout
    }

    pub fn notice_window(&self) -> Duration {
        self.notice_window
    }
}

/// Parse an optional seconds value, as read from an environment variable.
///
/// `None` or blank input yields `None`.
pub fn seconds_from_env_value(name: &str, value: Option<String>) -> PortalResult<Option<Duration>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    value
        .map(|v| {
            v.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                PortalError::InvalidConfig(format!("{name} must be a whole number of seconds"))
            })
        })
        .transpose()
}

/// Parse the transient-message window, falling back to the default when unset.
pub fn notice_window_from_env_value(value: Option<String>) -> PortalResult<Duration> {
    Ok(seconds_from_env_value("CMF_NOTICE_SECS", value)?
        .unwrap_or(Duration::from_secs(DEFAULT_NOTICE_SECS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let cfg = CoreConfig::new(
            "https://intake.example.com/api/ ",
            PathBuf::from("data"),
            None,
            Duration::from_secs(4),
        )
        .expect("config should be valid");

        assert_eq!(cfg.intake_base_url(), "https://intake.example.com/api");
        assert_eq!(cfg.profiles_dir(), PathBuf::from("data").join("profiles"));
        assert_eq!(
            cfg.preferences_path(),
            PathBuf::from("data").join("preferences.json")
        );
    }

    #[test]
    fn rejects_blank_or_non_http_base_url() {
        for bad in ["", "   ", "/", "ftp://intake.example.com"] {
            let err = CoreConfig::new(bad, PathBuf::new(), None, Duration::from_secs(4))
                .expect_err("should reject base url");
            assert!(matches!(err, PortalError::InvalidConfig(_)), "{bad}");
        }
    }

    #[test]
    fn rejects_zero_notice_window() {
        let err = CoreConfig::new("http://x", PathBuf::new(), None, Duration::ZERO)
            .expect_err("zero window should be rejected");
        assert!(matches!(err, PortalError::InvalidConfig(_)));
    }

    #[test]
    fn env_values_apply_defaults() {
        let cfg = CoreConfig::from_env_values(
            Some("http://localhost:8080/api".into()),
            None,
            Some("7".into()),
            None,
        )
        .unwrap();
        assert_eq!(cfg.data_dir(), Path::new("portal_data"));
        assert_eq!(cfg.intake_timeout(), Some(Duration::from_secs(7)));
        assert_eq!(cfg.notice_window(), Duration::from_secs(4));

        let err = CoreConfig::from_env_values(None, None, None, None).unwrap_err();
        assert!(matches!(err, PortalError::InvalidConfig(_)));
    }

    #[test]
    fn notice_window_defaults_to_four_seconds() {
        assert_eq!(
            notice_window_from_env_value(None).unwrap(),
            Duration::from_secs(4)
        );
        assert_eq!(
            notice_window_from_env_value(Some(" ".into())).unwrap(),
            Duration::from_secs(4)
        );
        assert_eq!(
            notice_window_from_env_value(Some("10".into())).unwrap(),
            Duration::from_secs(10)
        );
        assert!(notice_window_from_env_value(Some("soon".into())).is_err());
    }
}
