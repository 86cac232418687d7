//! Channel set ownership and rule-driven execution.

use crate::channel::{ChannelId, SharedChannel};
use crate::error::{BalancerError, BalancerResult};
use crate::observability::metrics;
use crate::rule::Rule;

/// Owns a fixed set of channels and an optional default rule.
#[derive(Debug)]
pub struct LoadBalancer {
    channels: Vec<SharedChannel>,
    default_rule: Option<Box<dyn Rule>>,
}

impl LoadBalancer {
    /// A balancer without a default rule; use the `*_with` methods.
    pub fn new(channels: Vec<SharedChannel>) -> Self {
        Self {
            channels,
            default_rule: None,
        }
    }

    pub fn with_default_rule(channels: Vec<SharedChannel>, rule: Box<dyn Rule>) -> Self {
        Self {
            channels,
            default_rule: Some(rule),
        }
    }

    /// Copy of the channel list. Changes to the returned vector are not seen
    /// by later selections.
    pub fn all_channels(&self) -> Vec<SharedChannel> {
        self.channels.clone()
    }

    pub fn channel(&self, id: ChannelId) -> Option<SharedChannel> {
        self.channels.iter().find(|c| c.id() == id).cloned()
    }

    pub fn default_rule(&self) -> Option<&dyn Rule> {
        self.default_rule.as_deref()
    }

    /// Select a channel with `rule`.
    pub fn choose_channel(&self, rule: &dyn Rule) -> BalancerResult<SharedChannel> {
        let channel = rule.choose(&self.all_channels())?;
        metrics::record_selection(rule.name(), channel.id());
        Ok(channel)
    }

    /// Select a channel with `rule` and run `operation` on it.
    ///
    /// `Err` only reports a selection failure. Whatever the operation returns,
    /// including its own errors, comes back untouched inside `Ok`.
    pub fn execute_with<F, R>(&self, rule: &dyn Rule, operation: F) -> BalancerResult<R>
    where
        F: FnOnce(SharedChannel) -> R,
    {
        let channel = self.choose_channel(rule)?;
        tracing::debug!(rule = rule.name(), channel = channel.id(), "Executing on channel");
        Ok(operation(channel))
    }

    /// Like [`execute_with`](Self::execute_with) using the default rule.
    pub fn execute<F, R>(&self, operation: F) -> BalancerResult<R>
    where
        F: FnOnce(SharedChannel) -> R,
    {
        let rule = self.default_rule().ok_or(BalancerError::NoDefaultRule)?;
        self.execute_with(rule, operation)
    }

    /// Run a fallible operation, folding selection errors into its error type.
    pub fn try_execute_with<F, T, E>(&self, rule: &dyn Rule, operation: F) -> Result<T, E>
    where
        F: FnOnce(SharedChannel) -> Result<T, E>,
        E: From<BalancerError>,
    {
        self.execute_with(rule, operation)?
    }

    pub fn try_execute<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce(SharedChannel) -> Result<T, E>,
        E: From<BalancerError>,
    {
        self.execute(operation)?
    }
}
