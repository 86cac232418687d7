//! Shared utilities for integration tests.

use std::time::Duration;

use channel_balancer::{BreakerSettings, ChannelId, Endpoint, SharedChannel};

/// Endpoints with default breaker settings.
pub fn channels(ids: &[ChannelId]) -> Vec<SharedChannel> {
    ids.iter()
        .map(|&id| Endpoint::new(id, format!("replica-{id}")).shared())
        .collect()
}

/// Endpoints with a short cooldown so tests can wait it out.
#[allow(dead_code)]
pub fn channels_with_cooldown(ids: &[ChannelId], cooldown: Duration, threshold: u32) -> Vec<SharedChannel> {
    let settings = BreakerSettings {
        cooldown,
        failure_threshold: threshold,
    };
    ids.iter()
        .map(|&id| Endpoint::with_settings(id, format!("replica-{id}"), settings).shared())
        .collect()
}

/// Trip every channel whose id is listed.
#[allow(dead_code)]
pub fn trip(channels: &[SharedChannel], ids: &[ChannelId]) {
    for channel in channels.iter().filter(|c| ids.contains(&c.id())) {
        channel.record_non_success();
    }
}
