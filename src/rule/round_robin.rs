//! Round-robin selection rule.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::channel::SharedChannel;
use crate::error::{BalancerError, BalancerResult};
use crate::rule::{first_channel, Rule};

/// Attempts made before falling back to the first channel.
pub const MAX_ATTEMPTS: usize = 10;

/// Round-robin selector.
/// Stores a shared counter to rotate through channels; the counter wraps on overflow.
#[derive(Debug, Default)]
pub struct RoundRobinRule {
    counter: AtomicUsize,
}

impl RoundRobinRule {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_index(&self, len: usize) -> usize {
        // fetch_add wraps, and the unsigned remainder is always in range.
        self.counter.fetch_add(1, Ordering::Relaxed) % len
    }
}

impl Rule for RoundRobinRule {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn choose(&self, channels: &[SharedChannel]) -> BalancerResult<SharedChannel> {
        if channels.is_empty() {
            return Err(BalancerError::EmptyChannelSet);
        }

        for _ in 0..MAX_ATTEMPTS {
            let channel = &channels[self.next_index(channels.len())];
            if channel.allows_request() {
                return Ok(channel.clone());
            }
            tracing::debug!(channel = channel.id(), "Channel interrupted, reselecting");
        }

        first_channel(self.name(), channels)
    }
}
