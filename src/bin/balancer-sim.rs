use std::collections::BTreeMap;
use std::path::PathBuf;

use channel_balancer::config::{self, RuleConfig};
use channel_balancer::observability::logging;
use channel_balancer::{BalancerResult, ChannelId, LoadBalancer};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "balancer-sim")]
#[command(about = "Drive simulated traffic through a channel load balancer", long_about = None)]
struct Cli {
    /// Balancer configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Number of operations to execute
    #[arg(short = 'n', long, default_value_t = 1000)]
    requests: usize,

    /// Probability that any single operation fails
    #[arg(short, long, default_value_t = 0.0, value_parser = parse_rate)]
    failure_rate: f64,

    /// Channels whose operations always fail
    #[arg(long = "fail-channel")]
    fail_channels: Vec<ChannelId>,

    /// Report failures as hard failures (trip immediately)
    #[arg(long)]
    hard: bool,

    /// Seed for failure injection and weighted draws
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the configured default rule
    #[arg(long, value_enum)]
    rule: Option<RuleArg>,

    /// Target channel for --rule assign
    #[arg(long, required_if_eq("rule", "assign"))]
    target: Option<ChannelId>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RuleArg {
    RoundRobin,
    Weighted,
    Assign,
}

#[derive(Serialize)]
struct Summary {
    requests: usize,
    successes: usize,
    failures: usize,
    selections: BTreeMap<ChannelId, usize>,
    channels: Vec<ChannelReport>,
}

#[derive(Serialize)]
struct ChannelReport {
    id: ChannelId,
    name: String,
    breaker: channel_balancer::channel::BreakerSnapshot,
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is not within 0.0..=1.0"))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.observability.log_level)?;

    let rule_config = match cli.rule {
        Some(RuleArg::RoundRobin) => Some(RuleConfig::RoundRobin),
        Some(RuleArg::Weighted) => Some(RuleConfig::Weighted),
        Some(RuleArg::Assign) => cli.target.map(|target| RuleConfig::Assign { target }),
        None => cfg.rule,
    };
    let rule = rule_config
        .map(|r| config::build_rule(&r, &cfg.channels, cli.seed))
        .ok_or("no rule configured; pass --rule or add a [rule] section")?;

    let rule_name = rule.name();
    let channels = config::build_channels(&cfg.channels, &cfg.breaker);
    let balancer = LoadBalancer::with_default_rule(channels, rule);
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!(
        requests = cli.requests,
        failure_rate = cli.failure_rate,
        rule = rule_name,
        "Starting simulation"
    );

    let mut summary = Summary {
        requests: cli.requests,
        successes: 0,
        failures: 0,
        selections: BTreeMap::new(),
        channels: Vec::new(),
    };

    for _ in 0..cli.requests {
        let outcome: BalancerResult<(ChannelId, bool)> = balancer.execute(|channel| {
            let failed = cli.fail_channels.contains(&channel.id()) || rng.gen_bool(cli.failure_rate);
            if !failed {
                channel.record_success();
            } else if cli.hard {
                channel.record_non_success();
            } else {
                channel.record_attempt_outcome();
            }
            (channel.id(), !failed)
        });

        let (id, ok) = outcome?;
        *summary.selections.entry(id).or_default() += 1;
        if ok {
            summary.successes += 1;
        } else {
            summary.failures += 1;
        }
    }

    for channel_cfg in &cfg.channels {
        if let Some(channel) = balancer.channel(channel_cfg.id) {
            summary.channels.push(ChannelReport {
                id: channel.id(),
                name: channel_cfg.display_name(),
                breaker: channel.breaker().snapshot(),
            });
        }
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
