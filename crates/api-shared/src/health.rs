use crate::dto::HealthRes;

/// Simple health service shared by the server binaries.
///
/// The portal keeps no connections open to its external services, so being able to answer
/// is the whole check.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Returns a `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "CMF portal is alive".into(),
        }
    }
}
