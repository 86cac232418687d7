//! Error definitions shared by rules and the balancer facade.

use thiserror::Error;

use crate::channel::ChannelId;

/// Errors that can occur while selecting a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalancerError {
    /// An assign rule could not find its target in the supplied channel list.
    #[error("Channel not found: {id}")]
    ChannelNotFound { id: ChannelId },

    /// A rule was asked to choose from an empty channel list.
    #[error("No channels to choose from")]
    EmptyChannelSet,

    /// `execute` was called without a rule on a balancer that has no default rule.
    #[error("No default rule configured for this load balancer")]
    NoDefaultRule,

    /// A weight configuration entry could not be turned into a table entry.
    #[error("Invalid weight entry '{key}': {reason}")]
    InvalidWeight { key: String, reason: String },
}

/// Result type for selection operations.
pub type BalancerResult<T> = Result<T, BalancerError>;
