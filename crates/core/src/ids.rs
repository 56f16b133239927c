//! Identifiers for users and assessments.
//!
//! Backends choose their own id formats, so both are carried as opaque validated strings.
//! The mock backends mint new ones from the `glyco-uuid` generators.

use glyco_types::OpaqueId;
use glyco_uuid::{AssessmentId, CanonicalId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::GlycoResult;

/// Identifies an account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(OpaqueId);

impl UserId {
    pub fn parse(input: impl AsRef<str>) -> GlycoResult<Self> {
        Ok(Self(OpaqueId::parse(input)?))
    }

    /// A fresh id in canonical UUID form.
    pub fn generate() -> GlycoResult<Self> {
        Self::parse(CanonicalId::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Identifies a stored risk assessment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(OpaqueId);

impl PredictionId {
    pub fn parse(input: impl AsRef<str>) -> GlycoResult<Self> {
        Ok(Self(OpaqueId::parse(input)?))
    }

    /// A fresh time-prefixed id that sorts after `last`.
    pub fn generate(last: Option<&AssessmentId>) -> GlycoResult<(Self, AssessmentId)> {
        let id = AssessmentId::generate(last);
        Ok((Self::parse(id.to_string())?, id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

macro_rules! id_text_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $ty {
            type Err = crate::GlycoError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

id_text_impls!(UserId);
id_text_impls!(PredictionId);
