//! Client-side channel load balancing with per-channel circuit breakers.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──▶ LoadBalancer::execute(operation[, rule])
//!                   │
//!                   ▼
//!              Rule::choose(&[channels])  ── assign / round_robin / weighted
//!                   │                         (consults allows_request())
//!                   ▼
//!              operation(channel) ──▶ result returned unchanged
//!                   │
//!                   ▼
//!   caller reports outcome: record_success / record_non_success / record_attempt_outcome
//! ```
//!
//! ```no_run
//! use channel_balancer::{Channel, Endpoint, LoadBalancer, RoundRobinRule};
//!
//! let balancer = LoadBalancer::with_default_rule(
//!     vec![Endpoint::new(101, "a").shared(), Endpoint::new(102, "b").shared()],
//!     Box::new(RoundRobinRule::new()),
//! );
//!
//! let reply = balancer.execute(|channel| {
//!     let ok = channel.id() != 0;
//!     if ok { channel.record_success() } else { channel.record_attempt_outcome(); }
//!     ok
//! });
//! assert!(reply.is_ok());
//! ```

// Core
pub mod channel;
pub mod load_balancer;
pub mod rule;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use channel::{Breaker, BreakerSettings, BreakerState, Channel, ChannelId, Endpoint, SharedChannel};
pub use config::BalancerConfig;
pub use error::{BalancerError, BalancerResult};
pub use load_balancer::LoadBalancer;
pub use rule::{AssignRule, RoundRobinRule, Rule, WeightTable, WeightedRule};
