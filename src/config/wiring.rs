//! Turning a configuration into live channels and rules.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::channel::{Channel, Endpoint, SharedChannel};
use crate::config::schema::{BalancerConfig, BreakerConfig, ChannelConfig, RuleConfig};
use crate::load_balancer::LoadBalancer;
use crate::observability::metrics;
use crate::rule::{AssignRule, RoundRobinRule, Rule, WeightTable, WeightedRule};

/// Construct endpoints, applying breaker settings and warm-start snapshots.
pub fn build_channels(channels: &[ChannelConfig], defaults: &BreakerConfig) -> Vec<SharedChannel> {
    channels
        .iter()
        .map(|config| {
            let endpoint = Endpoint::new(config.id, config.display_name());
            endpoint.initialize(
                config.breaker_settings(defaults),
                config.tripped_at(),
                config.consecutive_failures,
            );
            metrics::record_channel_availability(config.id, endpoint.is_available());
            endpoint.shared()
        })
        .collect()
}

/// Construct a rule. Weighted rules take their weights from `channels` in
/// order; `seed` makes their draws reproducible.
pub fn build_rule(rule: &RuleConfig, channels: &[ChannelConfig], seed: Option<u64>) -> Box<dyn Rule> {
    match *rule {
        RuleConfig::RoundRobin => Box::new(RoundRobinRule::new()),
        RuleConfig::Assign { target } => Box::new(AssignRule::new(target)),
        RuleConfig::Weighted => {
            let table = WeightTable::from_entries(channels.iter().map(|c| (c.id, c.weight)));
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            Box::new(WeightedRule::with_rng(table, rng))
        }
    }
}

/// Wire a complete balancer from configuration.
pub fn build_balancer(config: &BalancerConfig) -> LoadBalancer {
    let channels = build_channels(&config.channels, &config.breaker);

    let balancer = match &config.rule {
        Some(rule) => LoadBalancer::with_default_rule(channels, build_rule(rule, &config.channels, None)),
        None => LoadBalancer::new(channels),
    };

    tracing::info!(
        channels = config.channels.len(),
        rule = balancer.default_rule().map(|r| r.name()).unwrap_or("none"),
        "Load balancer ready"
    );
    balancer
}
