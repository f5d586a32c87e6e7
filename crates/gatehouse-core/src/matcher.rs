//! Template matching by Euclidean distance.
//!
//! Candidates are scanned in store order and the **first** one under
//! tolerance wins, not the nearest. When two enrolled identities are both
//! close to a probe, the one enrolled first is always chosen for a given
//! snapshot. Switching to nearest-match would change who gets let in and is
//! not something an index or optimisation may do implicitly.

use crate::errors::GatehouseError;
use crate::identity::EnrolledIdentity;

/// Maximum distance at which two encodings are treated as the same face.
pub const DEFAULT_TOLERANCE: f64 = 0.6;

/// Euclidean distance between two equal-length vectors.
///
/// # Errors
/// [`GatehouseError::DimensionMismatch`] when the lengths differ.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64, GatehouseError> {
    if a.len() != b.len() {
        return Err(GatehouseError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}

/// Linear first-match scanner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    tolerance: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl Matcher {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether `distance` counts as a match. The bound is exclusive.
    pub fn is_match(&self, distance: f64) -> bool {
        distance < self.tolerance
    }

    /// Returns the first candidate whose template lies strictly within
    /// tolerance of `probe`, or `None`.
    ///
    /// # Errors
    /// [`GatehouseError::DimensionMismatch`] if a candidate examined before a
    /// match is found has a different length than the probe.
    pub fn find_first_match<'a>(
        &self,
        probe: &[f64],
        candidates: &'a [EnrolledIdentity],
    ) -> Result<Option<&'a EnrolledIdentity>, GatehouseError> {
        for candidate in candidates {
            let distance = euclidean_distance(&candidate.encoding, probe)?;
            tracing::debug!(
                identity_id = %candidate.identity_id,
                distance,
                tolerance = self.tolerance,
                "compared probe against enrolled template"
            );
            if self.is_match(distance) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}
