//! Seam to the platform positioning service.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LocationError;

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// Policy for a single-shot position request.
#[derive(Debug, Clone)]
pub struct LocationPolicy {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the provider may return.
    pub max_age: Duration,
}

impl Default for LocationPolicy {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(20),
            max_age: Duration::from_secs(1),
        }
    }
}

/// Platform positioning service. One-shot: a request either yields a fix
/// or an error; there is no cancellation of an in-flight request.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, policy: &LocationPolicy)
        -> Result<LocationFix, LocationError>;
}

/// Provider that always reports the same fix. Useful for embedders without
/// positioning hardware and for tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticLocation(pub LocationFix);

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn current_position(
        &self,
        _policy: &LocationPolicy,
    ) -> Result<LocationFix, LocationError> {
        Ok(self.0)
    }
}
