//! Enrolled identities and the enrollment request that creates them.

use crate::errors::GatehouseError;
use crate::types::{Encoding, IdentityId, TimeWindow};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A registered person: stored template plus daily authorization window.
///
/// Identities are immutable once enrolled; nothing in this crate updates or
/// removes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrolledIdentity {
    /// Globally unique identity id.
    pub identity_id: IdentityId,
    /// Human readable name shown on grant/deny.
    pub display_name: String,
    /// Reference template the probe is compared against.
    pub encoding: Encoding,
    /// Daily authorization window, flattened to `allowed_start` / `allowed_end`.
    #[serde(flatten)]
    pub window: TimeWindow,
    /// Optional registration details, flattened into the record.
    #[serde(flatten)]
    pub contact: ContactDetails,
    /// When the identity was enrolled.
    #[serde(default = "enrollment_timestamp")]
    pub enrolled_at: DateTime<Utc>,
}

/// Format of `date_of_birth`.
pub const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";

/// Registration details kept alongside an identity. None of them take part
/// in access decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Opaque reference to the enrollment photo; never dereferenced here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
}

impl ContactDetails {
    /// Checks the one structured field, `date_of_birth`.
    pub fn validate(&self) -> Result<(), GatehouseError> {
        if let Some(dob) = &self.date_of_birth {
            let canonical = NaiveDate::parse_from_str(dob, DATE_OF_BIRTH_FORMAT)
                .map(|date| date.format(DATE_OF_BIRTH_FORMAT).to_string() == *dob)
                .unwrap_or(false);
            if !canonical {
                return Err(GatehouseError::validation_error(
                    "enrollment.date_of_birth",
                    "expected YYYY-MM-DD",
                ));
            }
        }
        Ok(())
    }
}

/// Microsecond precision so the value survives a round trip through `TIMESTAMPTZ`.
fn enrollment_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl EnrolledIdentity {
    /// Creates a new EnrolledIdentity stamped with the current time.
    pub fn new(
        identity_id: impl Into<IdentityId>,
        display_name: impl Into<String>,
        encoding: Encoding,
        window: TimeWindow,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            display_name: display_name.into(),
            encoding,
            window,
            contact: ContactDetails::default(),
            enrolled_at: enrollment_timestamp(),
        }
    }

    /// Attaches registration details.
    pub fn with_contact(mut self, contact: ContactDetails) -> Self {
        self.contact = contact;
        self
    }

    /// Dimensionality of the stored template.
    pub fn dimension(&self) -> usize {
        self.encoding.len()
    }
}

/// Enrollment payload as supplied by the registration front end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentRequest {
    pub identity_id: String,
    pub display_name: String,
    pub encoding: Encoding,
    pub allowed_start: String,
    pub allowed_end: String,
    #[serde(flatten)]
    pub contact: ContactDetails,
}

impl EnrollmentRequest {
    /// Validates the request and turns it into an [`EnrolledIdentity`].
    ///
    /// Encoding dimensionality is not checked here; that depends on the
    /// engine configuration.
    pub fn into_identity(self) -> Result<EnrolledIdentity, GatehouseError> {
        require_verbatim("enrollment.identity_id", &self.identity_id)?;
        require_verbatim("enrollment.display_name", &self.display_name)?;
        if self.encoding.iter().any(|v| !v.is_finite()) {
            return Err(GatehouseError::validation_error(
                "enrollment.encoding",
                "encoding components must be finite numbers",
            ));
        }
        let window = TimeWindow::parse(&self.allowed_start, &self.allowed_end)?;
        self.contact.validate()?;
        Ok(EnrolledIdentity::new(
            self.identity_id,
            self.display_name,
            self.encoding,
            window,
        )
        .with_contact(self.contact))
    }
}

/// Rejects empty values and values with surrounding whitespace; input is
/// stored exactly as given.
fn require_verbatim(context: &str, value: &str) -> Result<(), GatehouseError> {
    if value.trim().is_empty() {
        return Err(GatehouseError::validation_error(context, "must not be empty"));
    }
    if value.trim() != value {
        return Err(GatehouseError::validation_error(
            context,
            "must not have leading or trailing whitespace",
        ));
    }
    Ok(())
}
