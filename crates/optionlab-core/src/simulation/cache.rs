use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tracing::debug;

use crate::simulation::grid::SimulationConfig;
use crate::simulation::simulator::{simulate_with_config, PlResult};
use crate::strategy::leg::{EvaluationMode, MarketParameters, Strategy};
use crate::OptionLabResult;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Memoises [`simulate_with_config`] for interactive use, where the same
/// inputs are re-simulated on every redraw. Only successful results are kept.
pub struct SimulationCache {
    entries: LruCache<String, PlResult>,
    hits: u64,
    misses: u64,
}

impl Default for SimulationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl SimulationCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn simulate(
        &mut self,
        strategy: &Strategy,
        market: &MarketParameters,
        mode: EvaluationMode,
        config: &SimulationConfig,
    ) -> OptionLabResult<PlResult> {
        let key = cache_key(strategy, market, mode, config)?;
        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            debug!(hits = self.hits, "simulation cache hit");
            return Ok(hit.clone());
        }

        self.misses += 1;
        let result = simulate_with_config(strategy, market, mode, config)?;
        self.entries.put(key, result.clone());
        Ok(result)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The serialized inputs themselves. Decimal scale is part of the text,
/// so `1.0` and `1.00` are separate entries.
fn cache_key(
    strategy: &Strategy,
    market: &MarketParameters,
    mode: EvaluationMode,
    config: &SimulationConfig,
) -> OptionLabResult<String> {
    Ok(serde_json::to_string(&(strategy, market, mode, config))?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::leg::{Direction, OptionLeg, OptionType};
    use rust_decimal_macros::dec;

    fn long_call(strike: rust_decimal::Decimal) -> Strategy {
        Strategy::new("lc", dec!(100)).with_leg(OptionLeg::new(
            "c",
            OptionType::Call,
            Direction::Long,
            strike,
            dec!(1),
            dec!(5),
            dec!(0.25),
        ))
    }

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            grid_points: 21,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_hit_after_miss() {
        let mut cache = SimulationCache::new(4);
        let m = MarketParameters::new(dec!(100), dec!(0.2), dec!(0.05));
        let first = cache
            .simulate(&long_call(dec!(100)), &m, EvaluationMode::Today, &small_config())
            .unwrap();
        let second = cache
            .simulate(&long_call(dec!(100)), &m, EvaluationMode::Today, &small_config())
            .unwrap();
        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn test_eviction_and_errors_not_cached() {
        let mut cache = SimulationCache::new(1);
        let m = MarketParameters::new(dec!(100), dec!(0.2), dec!(0.05));
        let cfg = small_config();
        cache
            .simulate(&long_call(dec!(100)), &m, EvaluationMode::Today, &cfg)
            .unwrap();
        cache
            .simulate(&long_call(dec!(105)), &m, EvaluationMode::Today, &cfg)
            .unwrap();
        cache
            .simulate(&long_call(dec!(100)), &m, EvaluationMode::Today, &cfg)
            .unwrap();
        assert_eq!(cache.stats().misses, 3);

        let bad = Strategy::new("empty", dec!(100));
        assert!(cache.simulate(&bad, &m, EvaluationMode::Today, &cfg).is_err());
        assert_eq!(cache.stats().entries, 1);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_key_is_full_input_encoding() {
        let m = MarketParameters::new(dec!(100), dec!(0.2), dec!(0.05));
        let cfg = small_config();
        let key = |s: &Strategy, mode| cache_key(s, &m, mode, &cfg).unwrap();
        let a = key(&long_call(dec!(100)), EvaluationMode::Today);
        assert_eq!(a, key(&long_call(dec!(100)), EvaluationMode::Today));
        assert_ne!(a, key(&long_call(dec!(105)), EvaluationMode::Today));
        assert_ne!(a, key(&long_call(dec!(100)), EvaluationMode::AtExpiration));
        assert_eq!(a, serde_json::to_string(&(&long_call(dec!(100)), &m, EvaluationMode::Today, &cfg)).unwrap());
    }

    #[test]
    fn test_distinct_inputs_never_share_an_entry() {
        let mut cache = SimulationCache::new(8);
        let m = MarketParameters::new(dec!(100), dec!(0.2), dec!(0.05));
        let cfg = small_config();
        let near = cache.simulate(&long_call(dec!(100)), &m, EvaluationMode::Today, &cfg).unwrap();
        let far = cache.simulate(&long_call(dec!(105)), &m, EvaluationMode::Today, &cfg).unwrap();
        assert_ne!(near.total_pl, far.total_pl);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (0, 2, 2));
    }

    #[test]
    fn test_zero_capacity_raised() {
        assert_eq!(SimulationCache::new(0).stats().capacity, 1);
    }
}
