//! Channel subsystem.
//!
//! # Data Flow
//! ```text
//! Embedder constructs channels (endpoint.rs) at wiring time
//!     → each channel embeds a Breaker (breaker.rs)
//!     → rules read allows_request() while choosing
//!     → embedder reports outcomes after the operation:
//!         - record_success()          (reset)
//!         - record_non_success()      (hard failure, trips immediately)
//!         - record_attempt_outcome()  (soft failure, trips past threshold)
//! ```
//!
//! # Design Decisions
//! - Concrete channels supply identity and a breaker; everything else comes
//!   from the default methods on [`Channel`]
//! - Breaker state lives in memory only, one breaker per channel per process
//! - Channels are shared as `Arc<dyn Channel>` and never destroyed before exit

pub mod breaker;
pub mod endpoint;

use std::fmt::Debug;
use std::sync::Arc;

use crate::observability::metrics;

pub use breaker::{Breaker, BreakerSettings, BreakerSnapshot, BreakerState};
pub use endpoint::Endpoint;

/// Unique, comparable channel identifier.
pub type ChannelId = u32;

/// A channel shared between the balancer, rules, and callers.
pub type SharedChannel = Arc<dyn Channel>;

/// Capability interface every routable channel implements.
pub trait Channel: Send + Sync + Debug {
    fn id(&self) -> ChannelId;

    /// The breaker embedded in this channel.
    fn breaker(&self) -> &Breaker;

    fn is_available(&self) -> bool {
        self.breaker().is_available()
    }

    /// Whether a rule may select this channel right now.
    fn allows_request(&self) -> bool {
        self.breaker().allows_request()
    }

    fn record_success(&self) {
        if self.breaker().record_success() {
            tracing::info!(channel = self.id(), "Channel recovered");
            metrics::record_breaker_transition(self.id(), false);
        }
    }

    /// Hard failure: trip immediately.
    fn record_non_success(&self) {
        if self.breaker().trip() {
            tracing::info!(channel = self.id(), "Channel tripped");
            metrics::record_breaker_transition(self.id(), true);
        }
    }

    /// Soft failure: count it towards the threshold. Always returns true.
    fn record_attempt_outcome(&self) -> bool {
        if self.breaker().record_failure() {
            tracing::info!(
                channel = self.id(),
                failures = self.breaker().consecutive_failures(),
                "Channel tripped after consecutive failures"
            );
            metrics::record_breaker_transition(self.id(), true);
        }
        true
    }
}
