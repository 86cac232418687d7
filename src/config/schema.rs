//! Configuration schema definitions.
//!
//! This module defines the configuration structure for a balancer.
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::channel::breaker::{duration_millis, DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD};
use crate::channel::{BreakerSettings, ChannelId};

/// Root configuration for a channel load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Breaker defaults applied to every channel.
    pub breaker: BreakerConfig,

    /// Default rule. Absent means `execute` without a rule fails.
    pub rule: Option<RuleConfig>,

    /// Channel definitions, in selection order.
    pub channels: Vec<ChannelConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Breaker defaults.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Cooldown before a tripped channel may be retried, in milliseconds.
    pub cooldown_ms: u64,

    /// Consecutive soft failures tolerated before tripping.
    pub failure_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: duration_millis(DEFAULT_COOLDOWN),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// Rule selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    RoundRobin,
    /// Weights come from each channel's `weight`.
    Weighted,
    Assign { target: ChannelId },
}

/// A single channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Unique channel identifier.
    pub id: ChannelId,

    /// Display name for logs and reports.
    #[serde(default)]
    pub name: String,

    /// Weight for the weighted rule (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Per-channel override of `breaker.cooldown_ms`.
    #[serde(default)]
    pub cooldown_ms: Option<u64>,

    /// Per-channel override of `breaker.failure_threshold`.
    #[serde(default)]
    pub failure_threshold: Option<u32>,

    /// Warm start: last trip time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub tripped_at_ms: Option<u64>,

    /// Warm start: consecutive failures already observed.
    #[serde(default)]
    pub consecutive_failures: Option<u32>,
}

fn default_weight() -> u32 {
    1
}

impl ChannelConfig {
    pub fn new(id: ChannelId, name: impl Into<String>, weight: u32) -> Self {
        Self {
            id,
            name: name.into(),
            weight,
            cooldown_ms: None,
            failure_threshold: None,
            tripped_at_ms: None,
            consecutive_failures: None,
        }
    }

    /// Breaker settings after applying per-channel overrides.
    pub fn breaker_settings(&self, defaults: &BreakerConfig) -> BreakerSettings {
        BreakerSettings {
            cooldown: Duration::from_millis(self.cooldown_ms.unwrap_or(defaults.cooldown_ms)),
            failure_threshold: self.failure_threshold.unwrap_or(defaults.failure_threshold),
        }
    }

    pub fn tripped_at(&self) -> Option<SystemTime> {
        self.tripped_at_ms
            .and_then(|ms| UNIX_EPOCH.checked_add(Duration::from_millis(ms)))
    }

    /// Name used in reports; falls back to the id.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
