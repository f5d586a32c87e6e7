//! Defines the append-only access event recorded for every decision.

use crate::errors::GatehouseError;
use crate::types::IdentityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome persisted with each access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessStatus {
    /// The person was let through.
    Granted,
    /// The person was turned away.
    Denied,
}

impl AccessStatus {
    /// Storage representation (`GRANTED` / `DENIED`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Granted => "GRANTED",
            AccessStatus::Denied => "DENIED",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessStatus {
    type Err = GatehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GRANTED" => Ok(AccessStatus::Granted),
            "DENIED" => Ok(AccessStatus::Denied),
            other => Err(GatehouseError::validation_error(
                "access_event.status",
                &format!("unknown access status '{}'", other),
            )),
        }
    }
}

/// One immutable row of the access log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessEvent {
    /// Position in the log, assigned by the logger on append.
    pub event_id: i64,
    /// Identity the decision was about; `None` when nobody was determined.
    pub identity_id: Option<IdentityId>,
    /// Decision time.
    pub timestamp: DateTime<Utc>,
    pub status: AccessStatus,
    /// Free-text cause.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_text() {
        for status in [AccessStatus::Granted, AccessStatus::Denied] {
            assert_eq!(status.as_str().parse::<AccessStatus>().unwrap(), status);
        }
        assert!("granted".parse::<AccessStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&AccessStatus::Denied).unwrap(),
            "\"DENIED\""
        );
    }

    #[test]
    fn test_event_serialization_keeps_null_identity() {
        let event = AccessEvent {
            event_id: 1,
            identity_id: None,
            timestamp: Utc::now(),
            status: AccessStatus::Denied,
            reason: "face not recognized".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert!(value["identity_id"].is_null());
        assert_eq!(value["status"], "DENIED");
    }
}
