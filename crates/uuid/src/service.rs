//! Canonical and time-prefixed identifier implementations.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, Duration, Utc};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Glyco's canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to be in canonical form, so its string
/// form can be compared and stored without further normalisation.
///
/// # Construction
/// - [`CanonicalId::new`] generates a fresh random id (new identities).
/// - [`CanonicalId::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalId(Uuid);

impl Default for CanonicalId {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalId {
    /// Generates a new random (v4) id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an id that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are **not** accepted.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("'{}': {}", input, e)))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is exactly 32 lowercase hex characters.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for CanonicalId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalId::parse(s)
    }
}

/// A time-prefixed assessment identifier.
///
/// Format:
/// `YYYYMMDDTHHMMSS.mmmZ-<canonical_uuid>`
///
/// Example:
/// `20260111T143522.045Z-550e8400e29b41d4a716446655440000`
///
/// When [`AssessmentId::generate`] is given the previously issued id, the new timestamp is
/// strictly greater (bumped by 1 ms if the clock has not advanced), so ids issued by one
/// generator sort in issue order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssessmentId {
    timestamp: DateTime<Utc>,
    uuid: CanonicalId,
}

impl AssessmentId {
    /// Generate a new assessment id, strictly later than `last` if provided.
    pub fn generate(last: Option<&AssessmentId>) -> Self {
        let now = Utc::now();

        let timestamp = match last {
            Some(prev) if now <= prev.timestamp => prev.timestamp + Duration::milliseconds(1),
            _ => now,
        };

        Self {
            timestamp,
            uuid: CanonicalId::new(),
        }
    }

    /// Returns the timestamp component.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the UUID component.
    pub fn uuid(&self) -> &CanonicalId {
        &self.uuid
    }
}

impl FromStr for AssessmentId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts_str, uuid_str) = s.split_once('-').ok_or_else(|| {
            UuidError::InvalidInput(format!("Invalid assessment id format: '{}'", s))
        })?;

        let ts_no_z = ts_str.strip_suffix('Z').ok_or_else(|| {
            UuidError::InvalidInput(format!("Timestamp must end with 'Z': '{}'", ts_str))
        })?;

        let naive =
            chrono::NaiveDateTime::parse_from_str(ts_no_z, "%Y%m%dT%H%M%S%.3f").map_err(|e| {
                UuidError::InvalidInput(format!("Invalid timestamp format '{}': {}", ts_str, e))
            })?;

        Ok(Self {
            timestamp: DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
            uuid: CanonicalId::parse(uuid_str)?,
        })
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.timestamp.format("%Y%m%dT%H%M%S%.3fZ"),
            self.uuid
        )
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{AssessmentId, CanonicalId};
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for CanonicalId {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for CanonicalId {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            CanonicalId::parse(&s).map_err(D::Error::custom)
        }
    }

    impl Serialize for AssessmentId {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for AssessmentId {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = CanonicalId::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(CanonicalId::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_rejects_non_canonical_forms() {
        for bad in [
            "550e8400-e29b-41d4-a716-446655440000",
            "550E8400E29B41D4A716446655440000",
            "550e8400e29b41d4a71644665544000",
            "550e8400e29b41d4a7164466554400000",
            "550e8400e29b41d4a716446655440zzz",
            "",
        ] {
            match CanonicalId::parse(bad) {
                Err(UuidError::InvalidInput(msg)) => {
                    assert!(msg.contains("32 lowercase hex characters"), "{bad}")
                }
                Ok(_) => panic!("expected rejection of '{bad}'"),
            }
        }
    }

    #[test]
    fn test_parse_and_display_agree() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id: CanonicalId = canonical.parse().unwrap();

        assert_eq!(id.to_string(), canonical);
        assert_eq!(id.uuid().simple().to_string(), canonical);
    }

    #[test]
    fn test_assessment_id_generate_is_strictly_increasing() {
        let first = AssessmentId::generate(None);
        let second = AssessmentId::generate(Some(&first));
        let third = AssessmentId::generate(Some(&second));

        assert!(second.timestamp() > first.timestamp());
        assert!(third > second);
        assert!(third.to_string() > first.to_string());
    }

    #[test]
    fn test_assessment_id_parse_valid() {
        let valid = "20260111T143522.045Z-550e8400e29b41d4a716446655440000";
        let id = AssessmentId::from_str(valid).unwrap();

        assert_eq!(id.uuid().to_string(), "550e8400e29b41d4a716446655440000");
        assert_eq!(id.to_string(), valid);
    }

    #[test]
    fn test_assessment_id_parse_errors() {
        let missing_sep = "20260111T143522.045Z550e8400e29b41d4a716446655440000";
        match AssessmentId::from_str(missing_sep) {
            Err(UuidError::InvalidInput(msg)) => assert!(msg.contains("Invalid assessment id")),
            _ => panic!("Expected InvalidInput error"),
        }

        let missing_z = "20260111T143522.045-550e8400e29b41d4a716446655440000";
        match AssessmentId::from_str(missing_z) {
            Err(UuidError::InvalidInput(msg)) => assert!(msg.contains("must end with 'Z'")),
            _ => panic!("Expected InvalidInput error"),
        }

        let bad_date = "20260199T143522.045Z-550e8400e29b41d4a716446655440000";
        match AssessmentId::from_str(bad_date) {
            Err(UuidError::InvalidInput(msg)) => assert!(msg.contains("Invalid timestamp format")),
            _ => panic!("Expected InvalidInput error"),
        }

        assert!(AssessmentId::from_str("pred-001").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_uses_string_form() {
        let id = AssessmentId::from_str("20260111T143522.045Z-550e8400e29b41d4a716446655440000")
            .unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"20260111T143522.045Z-550e8400e29b41d4a716446655440000\"");

        let err = serde_json::from_str::<CanonicalId>("\"550e8400-e29b-41d4-a716-446655440000\"");
        assert!(err.is_err());
    }
}
