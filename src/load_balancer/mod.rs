//! Load balancing facade.
//!
//! # Data Flow
//! ```text
//! caller → LoadBalancer::execute(operation[, rule])
//!     → snapshot of the owned channel list
//!     → Rule::choose(snapshot)
//!     → operation(chosen channel)
//!     → result returned unchanged
//! ```
//!
//! # Design Decisions
//! - Channel set is fixed at construction; callers only ever see copies
//! - No retries and no breaker bookkeeping on behalf of the operation; the
//!   embedder reports outcomes on the chosen channel itself
//! - Everything runs on the caller's thread

pub mod pool;

pub use pool::LoadBalancer;
