//! Authenticated identity, bearer token and view access rules.

use chrono::{DateTime, Utc};
use glyco_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::ids::UserId;

/// The role an identity holds in the product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// An authenticated user's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[schema(value_type = String)]
    pub id: UserId,
    #[schema(value_type = String)]
    pub email: EmailAddress,
    #[schema(value_type = String)]
    pub name: NonEmptyText,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer token proving an authenticated identity.
///
/// `Debug` is redacted so tokens do not end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> crate::GlycoResult<Self> {
        let token = token.into();
        if token.trim().is_empty() || token.chars().any(char::is_whitespace) {
            return Err(crate::GlycoError::InvalidInput(
                "session token must be non-empty and contain no whitespace".into(),
            ));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionToken {
    type Error = crate::GlycoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(**redacted**)")
    }
}

/// The identity + token pair. One exists per authenticated session and the two are never
/// stored or cleared independently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub identity: Identity,
    pub token: SessionToken,
}

/// Response body of the auth backend's login and register calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthGrant {
    #[serde(rename = "user")]
    pub identity: Identity,
    #[schema(value_type = String)]
    pub token: SessionToken,
}

impl From<AuthGrant> for Credential {
    fn from(grant: AuthGrant) -> Self {
        Self {
            identity: grant.identity,
            token: grant.token,
        }
    }
}

/// Views the presentation layer can navigate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Landing,
    About,
    Faqs,
    Privacy,
    Terms,
    Feedback,
    Dashboard,
    Predict,
    Results,
    History,
    Analytics,
    Admin,
}

/// What a view requires of the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AdminOnly,
}

impl View {
    pub fn access(self) -> Access {
        match self {
            View::Landing
            | View::About
            | View::Faqs
            | View::Privacy
            | View::Terms
            | View::Feedback => Access::Public,
            View::Dashboard
            | View::Predict
            | View::Results
            | View::History
            | View::Analytics => Access::Authenticated,
            View::Admin => Access::AdminOnly,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            View::Landing => "landing",
            View::About => "about",
            View::Faqs => "faqs",
            View::Privacy => "privacy",
            View::Terms => "terms",
            View::Feedback => "feedback",
            View::Dashboard => "dashboard",
            View::Predict => "predict",
            View::Results => "results",
            View::History => "history",
            View::Analytics => "analytics",
            View::Admin => "admin",
        };
        f.write_str(s)
    }
}

impl Identity {
    /// Whether this identity may open `view`.
    pub fn can_access(&self, view: View) -> bool {
        match view.access() {
            Access::Public | Access::Authenticated => true,
            Access::AdminOnly => self.role == Role::Admin,
        }
    }
}
