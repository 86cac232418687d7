//! Weighted random selection rule.
//!
//! Weights are folded into a cumulative table. For A=10, B=30, C=40, D=20:
//! ```text
//! key  10 → A   draws in [0, 10)
//! key  40 → B   draws in [10, 40)
//! key  80 → C   draws in [40, 80)
//! key 100 → D   draws in [80, 100)
//! ```
//! A draw `r` in `[0, total)` selects the smallest key strictly greater than `r`.
//!
//! Rejected candidates (unknown id, or breaker disallows) have their bucket
//! removed from a per-call copy of the table, so the next draw is taken over
//! the remaining buckets only.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::{Mutex, PoisonError};

use crate::channel::{ChannelId, SharedChannel};
use crate::error::{BalancerError, BalancerResult};
use crate::rule::{first_channel, Rule};

/// Cumulative-weight table: running total → channel id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightTable {
    cumulative: BTreeMap<u64, ChannelId>,
}

impl WeightTable {
    /// Build from `(id, weight)` pairs, accumulating in iteration order.
    /// When two entries land on the same running total (zero weights), the
    /// first one keeps the key.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ChannelId, u32)>,
    {
        let mut cumulative = BTreeMap::new();
        let mut total: u64 = 0;
        for (id, weight) in entries {
            total += u64::from(weight);
            cumulative.entry(total).or_insert(id);
        }
        Self { cumulative }
    }

    /// Build from externally keyed weights such as `"101" → 10`.
    pub fn from_config<I, K>(entries: I) -> BalancerResult<Self>
    where
        I: IntoIterator<Item = (K, u32)>,
        K: AsRef<str>,
    {
        let parsed = entries
            .into_iter()
            .map(|(key, weight)| {
                let key = key.as_ref();
                key.trim()
                    .parse::<ChannelId>()
                    .map(|id| (id, weight))
                    .map_err(|e| BalancerError::InvalidWeight {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<BalancerResult<Vec<_>>>()?;
        Ok(Self::from_entries(parsed))
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// Largest cumulative key, or zero for an empty table.
    pub fn total_weight(&self) -> u64 {
        self.cumulative.keys().next_back().copied().unwrap_or(0)
    }

    /// Bucket containing `point`: the smallest key strictly greater than it.
    pub fn lookup(&self, point: u64) -> Option<(u64, ChannelId)> {
        self.cumulative
            .range((Excluded(point), Unbounded))
            .next()
            .map(|(&key, &id)| (key, id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, ChannelId)> + '_ {
        self.cumulative.iter().map(|(&key, &id)| (key, id))
    }

    fn remove(&mut self, key: u64) {
        self.cumulative.remove(&key);
    }
}

/// Weighted random selector with an injected random source.
#[derive(Debug)]
pub struct WeightedRule {
    table: WeightTable,
    rng: Mutex<StdRng>,
}

impl Default for WeightedRule {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedRule {
    /// An uninitialised rule; it always falls back to the first channel.
    pub fn new() -> Self {
        Self::with_rng(WeightTable::default(), StdRng::from_entropy())
    }

    /// Weighted rule over `weights` (channel id string → weight).
    pub fn from_config<I, K>(weights: I) -> BalancerResult<Self>
    where
        I: IntoIterator<Item = (K, u32)>,
        K: AsRef<str>,
    {
        let mut rule = Self::new();
        rule.initialize(weights)?;
        Ok(rule)
    }

    /// Deterministic rule for reproducible runs.
    pub fn with_seed(table: WeightTable, seed: u64) -> Self {
        Self::with_rng(table, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(table: WeightTable, rng: StdRng) -> Self {
        Self {
            table,
            rng: Mutex::new(rng),
        }
    }

    /// Replace the weight table.
    pub fn initialize<I, K>(&mut self, weights: I) -> BalancerResult<()>
    where
        I: IntoIterator<Item = (K, u32)>,
        K: AsRef<str>,
    {
        self.table = WeightTable::from_config(weights)?;
        Ok(())
    }

    pub fn weight_table(&self) -> &WeightTable {
        &self.table
    }

    fn draw(&self, total: u64) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..total)
    }
}

impl Rule for WeightedRule {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn choose(&self, channels: &[SharedChannel]) -> BalancerResult<SharedChannel> {
        if channels.is_empty() {
            return Err(BalancerError::EmptyChannelSet);
        }

        let mut working = self.table.clone();
        while !working.is_empty() {
            let total = working.total_weight();
            if total == 0 {
                // Only zero-width buckets are left; nothing can be drawn.
                break;
            }
            let point = self.draw(total);
            let Some((key, id)) = working.lookup(point) else {
                break;
            };
            tracing::debug!(total, point, bucket = key, candidate = id, "Weighted draw");

            match channels.iter().find(|channel| channel.id() == id) {
                Some(channel) if channel.allows_request() => return Ok(channel.clone()),
                Some(_) => tracing::debug!(channel = id, "Channel interrupted, reselecting"),
                None => tracing::debug!(channel = id, "Weighted channel not in channel list, reselecting"),
            }
            working.remove(key);
        }

        first_channel(self.name(), channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::testing::{endpoints, Probe};
    use std::collections::HashMap;

    fn abc_table() -> WeightTable {
        WeightTable::from_entries([(101, 10), (102, 20), (103, 30)])
    }

    fn tally(rule: &WeightedRule, channels: &[SharedChannel], draws: usize) -> HashMap<ChannelId, usize> {
        let mut counts = HashMap::new();
        for _ in 0..draws {
            *counts.entry(rule.choose(channels).unwrap().id()).or_default() += 1;
        }
        counts
    }

    #[test]
    fn test_cumulative_table() {
        let table = abc_table();
        let entries: Vec<_> = table.iter().collect();
        assert_eq!(entries, vec![(10, 101), (30, 102), (60, 103)]);
        assert_eq!(table.total_weight(), 60);
    }

    #[test]
    fn test_lookup_boundaries() {
        let table = abc_table();
        assert_eq!(table.lookup(0), Some((10, 101)));
        assert_eq!(table.lookup(9), Some((10, 101)));
        assert_eq!(table.lookup(10), Some((30, 102)));
        assert_eq!(table.lookup(59), Some((60, 103)));
        assert_eq!(table.lookup(60), None);
    }

    #[test]
    fn test_duplicate_cumulative_keeps_first() {
        let table = WeightTable::from_entries([(1, 5), (2, 0), (3, 5)]);
        let entries: Vec<_> = table.iter().collect();
        assert_eq!(entries, vec![(5, 1), (10, 3)]);
    }

    #[test]
    fn test_from_config_parses_keys() {
        let table = WeightTable::from_config([("101", 10), ("102", 20)]).unwrap();
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![(10, 101), (30, 102)]);

        let err = WeightTable::from_config([("abc", 1)]).unwrap_err();
        assert!(matches!(err, BalancerError::InvalidWeight { ref key, .. } if key == "abc"));
    }

    #[test]
    fn test_proportional_distribution() {
        let rule = WeightedRule::with_seed(abc_table(), 42);
        let channels = endpoints(&[101, 102, 103]);

        let counts = tally(&rule, &channels, 6000);
        for (id, expected) in [(101, 1000), (102, 2000), (103, 3000)] {
            let observed = counts[&id] as i64;
            assert!(
                (observed - expected).abs() < 150,
                "channel {id}: observed {observed}, expected ~{expected}"
            );
        }
    }

    #[test]
    fn test_heaviest_bucket_disallowed() {
        let rule = WeightedRule::with_seed(abc_table(), 7);
        let channels = endpoints(&[101, 102, 103]);
        channels[2].record_non_success();

        let counts = tally(&rule, &channels, 3000);
        assert!(!counts.contains_key(&103));
        // Remaining weights 10:20 split one third / two thirds.
        let a = counts[&101] as i64;
        assert!((a - 1000).abs() < 150, "observed {a}");
    }

    #[test]
    fn test_rejected_bucket_pruned_within_call() {
        let rule = WeightedRule::with_seed(abc_table(), 3);
        let probes = [Probe::new(101, false), Probe::new(102, false), Probe::new(103, false)];
        let channels: Vec<SharedChannel> = probes
            .iter()
            .map(|p| p.clone() as SharedChannel)
            .collect();

        let chosen = rule.choose(&channels).unwrap();
        assert_eq!(chosen.id(), 101);
        // Every bucket is checked exactly once before the fallback.
        for probe in &probes {
            assert_eq!(probe.checks(), 1);
        }
        // The shared table is untouched.
        assert_eq!(rule.weight_table().len(), 3);
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let table = WeightTable::from_entries([(999, 50), (101, 10)]);
        let rule = WeightedRule::with_seed(table, 11);
        let channels = endpoints(&[100, 101]);

        for _ in 0..50 {
            assert_eq!(rule.choose(&channels).unwrap().id(), 101);
        }
    }

    #[test]
    fn test_uninitialized_falls_back() {
        let rule = WeightedRule::new();
        let channels = endpoints(&[5, 6]);
        assert_eq!(rule.choose(&channels).unwrap().id(), 5);
    }

    #[test]
    fn test_zero_total_falls_back() {
        let rule = WeightedRule::with_seed(WeightTable::from_entries([(6, 0)]), 1);
        let channels = endpoints(&[5, 6]);
        assert_eq!(rule.choose(&channels).unwrap().id(), 5);
    }

    #[test]
    fn test_empty_channel_set() {
        let rule = WeightedRule::with_seed(abc_table(), 1);
        assert_eq!(rule.choose(&[]).unwrap_err(), BalancerError::EmptyChannelSet);
    }

    #[test]
    fn test_initialize_replaces_table() {
        let mut rule = WeightedRule::from_config([("1", 1)]).unwrap();
        rule.initialize([("2", 4), ("3", 4)]).unwrap();
        assert_eq!(rule.weight_table().iter().collect::<Vec<_>>(), vec![(4, 2), (8, 3)]);
    }
}
