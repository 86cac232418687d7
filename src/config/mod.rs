//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → wiring.rs (endpoints + default rule → LoadBalancer)
//! ```
//!
//! # Design Decisions
//! - Config is read once at wiring time; the channel set never changes afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod wiring;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BalancerConfig, BreakerConfig, ChannelConfig, ObservabilityConfig, RuleConfig};
pub use validation::ValidationError;
pub use wiring::{build_balancer, build_channels, build_rule};
