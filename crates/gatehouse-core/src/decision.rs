//! The verdict handed back to the caller for each access request.

use crate::errors::GatehouseError;
use crate::types::IdentityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an access request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialReason {
    /// Upstream extraction produced no template.
    #[serde(rename = "no face detected")]
    NoFaceDetected,
    /// No enrolled template within tolerance.
    #[serde(rename = "face not recognized")]
    NotRecognized,
    /// Matched an identity outside its allowed window.
    #[serde(rename = "time restriction")]
    TimeRestriction,
    /// A direct window check named an id that is not enrolled.
    #[serde(rename = "unknown employee id")]
    UnknownIdentity,
}

impl DenialReason {
    /// Canonical text, also used as the access event reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NoFaceDetected => "no face detected",
            DenialReason::NotRecognized => "face not recognized",
            DenialReason::TimeRestriction => "time restriction",
            DenialReason::UnknownIdentity => "unknown employee id",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What stopped a decision from being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The probe itself was unusable: wrong dimension or non-finite values.
    InvalidProbe,
    /// The template store or access log could not be reached.
    StorageUnavailable,
    /// Anything else.
    Internal,
}

impl From<&GatehouseError> for FailureKind {
    fn from(err: &GatehouseError) -> Self {
        match err {
            GatehouseError::DimensionMismatch { .. }
            | GatehouseError::ValidationError { .. }
            | GatehouseError::InvalidTimeWindow { .. } => FailureKind::InvalidProbe,
            GatehouseError::StorageUnavailable(_) => FailureKind::StorageUnavailable,
            GatehouseError::DuplicateIdentity(_) | GatehouseError::ConfigError(_) => {
                FailureKind::Internal
            }
        }
    }
}

/// Outcome of a single decision call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    Granted {
        identity_id: IdentityId,
        display_name: String,
    },
    Denied {
        reason: DenialReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    /// The decision could not be made (storage down, malformed probe).
    Error { failure: FailureKind, reason: String },
}

impl Decision {
    pub fn denied(reason: DenialReason) -> Self {
        Decision::Denied {
            reason,
            display_name: None,
        }
    }

    /// Wraps an error that prevented a decision.
    pub fn failed(err: &GatehouseError) -> Self {
        Decision::Error {
            failure: FailureKind::from(err),
            reason: err.to_string(),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted { .. })
    }

    /// One-line message suitable for a checkpoint display.
    pub fn summary(&self) -> String {
        match self {
            Decision::Granted { display_name, .. } => {
                format!("Access GRANTED for {}.", display_name)
            }
            Decision::Denied {
                reason: DenialReason::TimeRestriction,
                display_name: Some(name),
            } => format!("Access DENIED for {} (time restriction).", name),
            Decision::Denied {
                reason: DenialReason::NotRecognized,
                ..
            } => "Face not recognized. Visitors must sign in manually.".to_string(),
            Decision::Denied {
                reason,
                display_name,
            } => match display_name {
                Some(name) => format!("Access DENIED for {} ({}).", name, reason),
                None => format!("Access DENIED ({}).", reason),
            },
            Decision::Error { reason, .. } => format!("Access check failed: {}", reason),
        }
    }
}
