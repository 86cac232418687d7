//! Metric recording.
//!
//! # Metrics
//! - `balancer_selections_total` (counter): selections by rule and channel
//! - `balancer_fallbacks_total` (counter): degraded first-channel picks by rule
//! - `balancer_breaker_transitions_total` (counter): breaker flips by channel and target state
//! - `balancer_channel_available` (gauge): 1=available, 0=tripped

use ::metrics::{counter, gauge};

use crate::channel::ChannelId;

pub fn record_selection(rule: &'static str, channel: ChannelId) {
    counter!(
        "balancer_selections_total",
        "rule" => rule,
        "channel" => channel.to_string()
    )
    .increment(1);
}

pub fn record_fallback(rule: &'static str) {
    counter!("balancer_fallbacks_total", "rule" => rule).increment(1);
}

pub fn record_breaker_transition(channel: ChannelId, tripped: bool) {
    let to = if tripped { "tripped" } else { "available" };
    counter!(
        "balancer_breaker_transitions_total",
        "channel" => channel.to_string(),
        "to" => to
    )
    .increment(1);
    record_channel_availability(channel, !tripped);
}

pub fn record_channel_availability(channel: ChannelId, available: bool) {
    gauge!("balancer_channel_available", "channel" => channel.to_string())
        .set(if available { 1.0 } else { 0.0 });
}
