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

#![deny(unsafe_code)]
#![allow(missing_docs)] // Documentation is incomplete; re-enable once ready

//! Gatehouse access-decision engine.
//!
//! Matches a probe biometric template against enrolled identities, applies
//! each identity's daily time window, and appends an audit event for every
//! decision. Image handling and template extraction live outside this crate.

pub mod clock;
pub mod config;
pub mod decision;
pub mod engine;
pub mod errors;
pub mod event;
pub mod identity;
pub mod matcher;
/// Time-of-day authorization policy.
pub mod policy;
pub mod store;
pub mod types;

/// Test fixtures shared by unit and integration tests
pub mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, TimeRestrictedLogging};
pub use decision::{Decision, DenialReason, FailureKind};
pub use engine::DecisionEngine;
pub use errors::GatehouseError;
pub use event::{AccessEvent, AccessStatus};
pub use identity::{ContactDetails, EnrolledIdentity, EnrollmentRequest};
pub use matcher::Matcher;
pub use policy::PolicyEvaluator;
pub use store::{AccessLogger, InMemoryAccessLog, InMemoryTemplateStore, TemplateStore};
pub use types::{Encoding, IdentityId, TimeWindow};
