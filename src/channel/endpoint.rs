//! Concrete channel backed by an embedded breaker.

use std::sync::Arc;
use std::time::SystemTime;

use crate::channel::breaker::duration_millis;
use crate::channel::{Breaker, BreakerSettings, Channel, ChannelId, SharedChannel};

/// A named upstream endpoint.
#[derive(Debug)]
pub struct Endpoint {
    id: ChannelId,
    name: String,
    breaker: Breaker,
}

impl Endpoint {
    /// Create an endpoint with default breaker settings.
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self::with_settings(id, name, BreakerSettings::default())
    }

    pub fn with_settings(id: ChannelId, name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            id,
            name: name.into(),
            breaker: Breaker::new(settings),
        }
    }

    /// Apply breaker settings and optionally restore a persisted snapshot.
    pub fn initialize(
        &self,
        settings: BreakerSettings,
        tripped_at: Option<SystemTime>,
        consecutive_failures: Option<u32>,
    ) {
        tracing::debug!(
            channel = self.id,
            cooldown_ms = duration_millis(settings.cooldown),
            failure_threshold = settings.failure_threshold,
            restored = tripped_at.is_some() || consecutive_failures.is_some(),
            "Initializing channel breaker"
        );
        self.breaker
            .initialize(settings, tripped_at, consecutive_failures);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrap into a shareable trait object.
    pub fn shared(self) -> SharedChannel {
        Arc::new(self)
    }
}

impl Channel for Endpoint {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn breaker(&self) -> &Breaker {
        &self.breaker
    }
}
