//! Fixed-assignment rule.

use crate::channel::{ChannelId, SharedChannel};
use crate::error::{BalancerError, BalancerResult};
use crate::rule::Rule;

/// Always routes to one configured channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignRule {
    target: ChannelId,
}

impl AssignRule {
    pub fn new(target: ChannelId) -> Self {
        Self { target }
    }

    pub fn target(&self) -> ChannelId {
        self.target
    }
}

impl Rule for AssignRule {
    fn name(&self) -> &'static str {
        "assign"
    }

    /// Linear scan for the target. Breaker state is not consulted and there
    /// is no fallback: a missing target is an error.
    fn choose(&self, channels: &[SharedChannel]) -> BalancerResult<SharedChannel> {
        channels
            .iter()
            .find(|channel| channel.id() == self.target)
            .cloned()
            .ok_or(BalancerError::ChannelNotFound { id: self.target })
    }
}
