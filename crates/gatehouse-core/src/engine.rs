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

//! The decision engine: one verdict, and one audit row, per access request.
//!
//! ```text
//! Start ─┬─ probe absent/empty ──────────────► Denied("no face detected")
//!        └─ match against store snapshot ─┬─ none ─► Denied("face not recognized")
//!                                         └─ I ─┬─ in window ─► Granted(I)
//!                                               └─ outside ───► Denied("time restriction", I)
//! ```
//!
//! Storage failures and malformed probes surface as [`Decision::Error`] and
//! leave the log untouched.

use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, TimeRestrictedLogging};
use crate::decision::{Decision, DenialReason};
use crate::errors::GatehouseError;
use crate::event::AccessStatus;
use crate::identity::{EnrolledIdentity, EnrollmentRequest};
use crate::matcher::Matcher;
use crate::policy::PolicyEvaluator;
use crate::store::{AccessLogger, TemplateStore};
use crate::types::IdentityId;
use std::sync::Arc;

/// Reason text recorded alongside a granted decision.
pub const GRANTED_REASON: &str = "access granted";

/// Orchestrates matching, window policy and audit logging.
///
/// Cheap to clone; every clone shares the same stores.
#[derive(Clone)]
pub struct DecisionEngine {
    templates: Arc<dyn TemplateStore>,
    logger: Arc<dyn AccessLogger>,
    clock: Arc<dyn Clock>,
    matcher: Matcher,
    policy: PolicyEvaluator,
    config: EngineConfig,
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("matcher", &self.matcher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DecisionEngine {
    /// Creates an engine over the given stores and clock.
    ///
    /// # Errors
    /// [`GatehouseError::ConfigError`] if `config` does not validate.
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        logger: Arc<dyn AccessLogger>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self, GatehouseError> {
        config.validate()?;
        Ok(Self {
            templates,
            logger,
            clock,
            matcher: Matcher::new(config.tolerance),
            policy: PolicyEvaluator::new(),
            config,
        })
    }

    /// Creates an engine that reads the host's local wall clock.
    pub fn with_system_clock(
        templates: Arc<dyn TemplateStore>,
        logger: Arc<dyn AccessLogger>,
        config: EngineConfig,
    ) -> Result<Self, GatehouseError> {
        Self::new(templates, logger, Arc::new(SystemClock), config)
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The template store this engine reads from.
    pub fn templates(&self) -> &Arc<dyn TemplateStore> {
        &self.templates
    }

    /// The access log this engine appends to.
    pub fn logger(&self) -> &Arc<dyn AccessLogger> {
        &self.logger
    }

    /// Validates and enrolls a new identity.
    ///
    /// Enrollment never writes to the access log.
    ///
    /// # Errors
    /// * [`GatehouseError::ValidationError`] / [`GatehouseError::InvalidTimeWindow`]
    ///   for malformed requests, including windows that cross midnight.
    /// * [`GatehouseError::DimensionMismatch`] if the encoding length differs
    ///   from the configured dimension.
    /// * [`GatehouseError::DuplicateIdentity`] if the id is taken.
    pub async fn enroll(
        &self,
        request: EnrollmentRequest,
    ) -> Result<EnrolledIdentity, GatehouseError> {
        let identity = request.into_identity()?;
        self.ensure_dimension(identity.dimension())?;
        self.templates.enroll(identity.clone()).await?;
        tracing::info!(
            identity_id = %identity.identity_id,
            window = %identity.window,
            "identity enrolled"
        );
        Ok(identity)
    }

    /// Decides whether the holder of `probe` may pass.
    ///
    /// `None` or an empty slice means the upstream extraction found no face.
    pub async fn decide(&self, probe: Option<&[f64]>) -> Decision {
        self.try_decide(probe)
            .await
            .unwrap_or_else(|err| self.fail(err))
    }

    /// Runs the window check for a known identity id, bypassing the matcher.
    ///
    /// An id that is not enrolled is a terminal denial.
    pub async fn check_access(&self, identity_id: &IdentityId) -> Decision {
        self.try_check_access(identity_id)
            .await
            .unwrap_or_else(|err| self.fail(err))
    }

    async fn try_decide(&self, probe: Option<&[f64]>) -> Result<Decision, GatehouseError> {
        let probe = match probe {
            Some(probe) if !probe.is_empty() => probe,
            _ => return self.deny(None, DenialReason::NoFaceDetected, None).await,
        };
        self.ensure_dimension(probe.len())?;
        if probe.iter().any(|v| !v.is_finite()) {
            return Err(GatehouseError::validation_error(
                "probe",
                "probe components must be finite numbers",
            ));
        }

        let snapshot = self.templates.list_all().await?;
        match self.matcher.find_first_match(probe, &snapshot)? {
            Some(identity) => self.authorize(identity).await,
            None => self.deny(None, DenialReason::NotRecognized, None).await,
        }
    }

    async fn try_check_access(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Decision, GatehouseError> {
        match self.templates.get(identity_id).await? {
            Some(identity) => self.authorize(&identity).await,
            None => {
                tracing::warn!(identity_id = %identity_id, "window check for unknown identity");
                self.deny(None, DenialReason::UnknownIdentity, None).await
            }
        }
    }

    async fn authorize(&self, identity: &EnrolledIdentity) -> Result<Decision, GatehouseError> {
        let now = self.clock.local_time();
        if self.policy.is_within_window(identity, now) {
            self.logger
                .record(
                    Some(identity.identity_id.clone()),
                    AccessStatus::Granted,
                    GRANTED_REASON,
                )
                .await?;
            tracing::info!(identity_id = %identity.identity_id, "access granted");
            return Ok(Decision::Granted {
                identity_id: identity.identity_id.clone(),
                display_name: identity.display_name.clone(),
            });
        }

        match self.config.time_restricted_logging {
            TimeRestrictedLogging::Record => {
                self.deny(
                    Some(identity.identity_id.clone()),
                    DenialReason::TimeRestriction,
                    Some(identity.display_name.clone()),
                )
                .await
            }
            TimeRestrictedLogging::Skip => {
                tracing::warn!(
                    identity_id = %identity.identity_id,
                    reason = %DenialReason::TimeRestriction,
                    "access denied (not recorded)"
                );
                Ok(Decision::Denied {
                    reason: DenialReason::TimeRestriction,
                    display_name: Some(identity.display_name.clone()),
                })
            }
        }
    }

    async fn deny(
        &self,
        identity_id: Option<IdentityId>,
        reason: DenialReason,
        display_name: Option<String>,
    ) -> Result<Decision, GatehouseError> {
        let event = self
            .logger
            .record(identity_id, AccessStatus::Denied, reason.as_str())
            .await?;
        tracing::warn!(
            event_id = event.event_id,
            identity_id = ?event.identity_id,
            reason = %reason,
            "access denied"
        );
        Ok(Decision::Denied {
            reason,
            display_name,
        })
    }

    fn ensure_dimension(&self, actual: usize) -> Result<(), GatehouseError> {
        if actual != self.config.encoding_dimension {
            return Err(GatehouseError::DimensionMismatch {
                expected: self.config.encoding_dimension,
                actual,
            });
        }
        Ok(())
    }

    fn fail(&self, err: GatehouseError) -> Decision {
        tracing::error!(error = %err, "access decision failed");
        Decision::failed(&err)
    }
}
