// Copyright 2024 Gatehouse Project
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![warn(missing_docs)]

//! Time-of-day authorization policy.
//!
//! Each enrolled identity carries exactly one daily window. A request is
//! authorized when the local time of day falls inside that window, bounds
//! included. There is no calendar, day-of-week or holiday dimension, and
//! windows never wrap past midnight (enrollment rejects them).

use crate::identity::EnrolledIdentity;
use chrono::NaiveTime;

/// Decides whether an identity may pass at a given time of day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    /// Creates a new evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Checks `allowed_start <= now <= allowed_end` for the identity's window.
    ///
    /// # Arguments
    /// * `identity` - The matched identity.
    /// * `now` - Local time of day at which the decision is made.
    ///
    /// # Returns
    /// * `true` if access is permitted at `now`.
    /// * `false` otherwise.
    pub fn is_within_window(&self, identity: &EnrolledIdentity, now: NaiveTime) -> bool {
        let allowed = identity.window.contains(now);
        tracing::debug!(
            identity_id = %identity.identity_id,
            window = %identity.window,
            now = %now.format("%H:%M:%S"),
            allowed,
            "evaluated time window"
        );
        allowed
    }
}
