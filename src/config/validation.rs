//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (assign target exists)
//! - Validate value ranges (weights and thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use thiserror::Error;

use crate::channel::ChannelId;
use crate::config::schema::{BalancerConfig, RuleConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no channels configured")]
    NoChannels,

    #[error("duplicate channel id {0}")]
    DuplicateChannel(ChannelId),

    #[error("channel {0} has zero weight")]
    ZeroWeight(ChannelId),

    #[error("failure threshold must be positive (channel {0:?})")]
    ZeroFailureThreshold(Option<ChannelId>),

    #[error("assign target {0} is not a configured channel")]
    UnknownAssignTarget(ChannelId),
}

pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.channels.is_empty() {
        errors.push(ValidationError::NoChannels);
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold(None));
    }

    let mut seen = HashSet::new();
    for channel in &config.channels {
        if !seen.insert(channel.id) {
            errors.push(ValidationError::DuplicateChannel(channel.id));
        }
        if channel.weight == 0 {
            errors.push(ValidationError::ZeroWeight(channel.id));
        }
        if channel.failure_threshold == Some(0) {
            errors.push(ValidationError::ZeroFailureThreshold(Some(channel.id)));
        }
    }

    if let Some(RuleConfig::Assign { target }) = config.rule {
        if !seen.contains(&target) {
            errors.push(ValidationError::UnknownAssignTarget(target));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
