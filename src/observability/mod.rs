//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Rules, breakers, and the facade produce:
//!     → tracing events (structured fields: rule, channel, failures)
//!     → metrics.rs (counters and gauges through the `metrics` facade)
//!
//! Consumers:
//!     → logging.rs installs a fmt subscriber for binaries
//!     → embedders install their own metrics recorder/exporter
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder itself
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
