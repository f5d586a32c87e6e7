//! Fixtures for building templates and engines in tests.
//!
//! Templates are deterministic so a failing test reproduces exactly.

use crate::clock::FixedClock;
use crate::config::EngineConfig;
use crate::engine::DecisionEngine;
use crate::errors::GatehouseError;
use crate::identity::{ContactDetails, EnrollmentRequest};
use crate::store::{InMemoryAccessLog, InMemoryTemplateStore};
use crate::types::Encoding;
use std::sync::Arc;

/// A reproducible template of length `dimension`, distinct per `seed`.
///
/// Components lie in `[-0.5, 0.5)`; templates for different seeds are far
/// apart compared to the default tolerance.
pub fn template(dimension: usize, seed: u64) -> Encoding {
    let stream = splitmix64(seed);
    (0..dimension as u64)
        .map(|i| (splitmix64(stream ^ i) >> 11) as f64 / (1u64 << 53) as f64 - 0.5)
        .collect()
}

fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A copy of `base` shifted so that its Euclidean distance from `base` is `distance`.
pub fn at_distance(base: &[f64], distance: f64) -> Encoding {
    let mut probe = base.to_vec();
    if let Some(first) = probe.first_mut() {
        *first += distance;
    }
    probe
}

/// An enrollment request with a `HH:MM` window.
pub fn enrollment(
    identity_id: &str,
    display_name: &str,
    encoding: Encoding,
    allowed_start: &str,
    allowed_end: &str,
) -> EnrollmentRequest {
    EnrollmentRequest {
        identity_id: identity_id.to_string(),
        display_name: display_name.to_string(),
        encoding,
        allowed_start: allowed_start.to_string(),
        allowed_end: allowed_end.to_string(),
        contact: ContactDetails::default(),
    }
}

/// An engine over fresh in-memory stores, pinned to a fixed clock.
pub struct TestHarness {
    pub engine: DecisionEngine,
    pub store: InMemoryTemplateStore,
    pub log: InMemoryAccessLog,
    pub clock: Arc<FixedClock>,
}

impl TestHarness {
    /// Harness with the given config and the clock set to `hour:minute`.
    pub fn new(config: EngineConfig, hour: u32, minute: u32) -> Result<Self, GatehouseError> {
        let store = InMemoryTemplateStore::new();
        let log = InMemoryAccessLog::new();
        let clock = Arc::new(FixedClock::at(hour, minute));
        let engine = DecisionEngine::new(
            Arc::new(store.clone()),
            Arc::new(log.clone()),
            clock.clone(),
            config,
        )?;
        Ok(Self {
            engine,
            store,
            log,
            clock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::euclidean_distance;

    #[test]
    fn test_templates_are_deterministic_and_distinct() {
        assert_eq!(template(128, 1), template(128, 1));
        let distance = euclidean_distance(&template(128, 1), &template(128, 2)).unwrap();
        assert!(distance > 1.0, "distance was {distance}");
    }

    #[test]
    fn test_at_distance() {
        let base = template(128, 7);
        let probe = at_distance(&base, 0.3);
        let distance = euclidean_distance(&base, &probe).unwrap();
        assert!((distance - 0.3).abs() < 1e-9);
    }
}
