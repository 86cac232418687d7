//! Channel selection rules.
//!
//! # Data Flow
//! ```text
//! LoadBalancer snapshot of channels
//!     → Rule::choose(&[SharedChannel]):
//!         - assign.rs       (fixed id lookup, no fallback)
//!         - round_robin.rs  (cyclic counter, up to 10 attempts)
//!         - weighted.rs     (cumulative-weight random draw, prunes rejected buckets)
//!     → chosen channel, or BalancerError
//! ```
//!
//! # Design Decisions
//! - Rules never own channels; the live list is passed on every call
//! - Round-robin and weighted never return nothing: once every candidate
//!   is rejected they degrade to the first channel, even if it is tripped
//! - Assign fails hard instead of falling back

pub mod assign;
pub mod round_robin;
pub mod weighted;

use std::fmt::Debug;

use crate::channel::SharedChannel;
use crate::error::{BalancerError, BalancerResult};
use crate::observability::metrics;

pub use assign::AssignRule;
pub use round_robin::RoundRobinRule;
pub use weighted::{WeightTable, WeightedRule};

/// A channel-selection strategy.
pub trait Rule: Send + Sync + Debug {
    /// Short strategy name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Pick one channel from `channels`.
    fn choose(&self, channels: &[SharedChannel]) -> BalancerResult<SharedChannel>;
}

/// Degraded-mode pick used once every candidate has been rejected.
/// The returned channel may itself disallow requests.
pub(crate) fn first_channel(rule: &'static str, channels: &[SharedChannel]) -> BalancerResult<SharedChannel> {
    let channel = channels.first().ok_or(BalancerError::EmptyChannelSet)?;
    tracing::warn!(
        rule,
        channel = channel.id(),
        available = channel.is_available(),
        "No channel accepted the request, falling back to first channel"
    );
    metrics::record_fallback(rule);
    Ok(channel.clone())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::channel::{Breaker, Channel, ChannelId, Endpoint, SharedChannel};

    /// Endpoints with the given ids, all available.
    pub fn endpoints(ids: &[ChannelId]) -> Vec<SharedChannel> {
        ids.iter()
            .map(|&id| Endpoint::new(id, format!("ch-{id}")).shared())
            .collect()
    }

    /// A channel with a fixed verdict that counts how often it was asked.
    #[derive(Debug)]
    pub struct Probe {
        pub id: ChannelId,
        pub allow: bool,
        pub checks: AtomicUsize,
        breaker: Breaker,
    }

    impl Probe {
        pub fn new(id: ChannelId, allow: bool) -> Arc<Self> {
            Arc::new(Self {
                id,
                allow,
                checks: AtomicUsize::new(0),
                breaker: Breaker::default(),
            })
        }

        pub fn checks(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }
    }

    impl Channel for Probe {
        fn id(&self) -> ChannelId {
            self.id
        }

        fn breaker(&self) -> &Breaker {
            &self.breaker
        }

        fn allows_request(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.allow
        }
    }
}
