//! Validated text types shared across the Glyco crates.
//!
//! Values of these types are checked once, at construction or deserialisation, so downstream
//! code (session persistence, HTTP handlers, the auth backends) can rely on them without
//! re-validating.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input is not a plausible email address
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
    /// The input cannot be used as an identifier
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// An email address used as a login identifier.
///
/// Only a shape check is applied: exactly one `@`, non-empty local part and domain, a dot in the
/// domain and no whitespace. Comparison is case-insensitive because the stored form is
/// lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and normalises an email address.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let invalid = || TextError::InvalidEmail(trimmed.to_owned());

        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(invalid());
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part before the `@`.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EmailAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// An identifier issued by some other system, carried verbatim.
///
/// No format is assumed (`"1"`, `"pred-001"`, hyphenated or simple UUIDs are all accepted).
/// The value must be non-empty and contain no whitespace, `/`, `?` or `#`, so it can be placed
/// in a URL path segment as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpaqueId(String);

impl OpaqueId {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(TextError::Empty);
        }
        if input
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#'))
        {
            return Err(TextError::InvalidIdentifier(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OpaqueId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for OpaqueId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for OpaqueId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OpaqueId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Ada Lovelace ").expect("valid text");
        assert_eq!(text.as_str(), "Ada Lovelace");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        let err = NonEmptyText::new("   ").expect_err("should reject whitespace");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn email_is_lowercased_and_split() {
        let email = EmailAddress::parse(" Jane.Doe@Example.COM ").expect("valid email");
        assert_eq!(email.as_str(), "jane.doe@example.com");
        assert_eq!(email.local_part(), "jane.doe");
    }

    #[test]
    fn email_rejects_malformed_input() {
        for bad in ["jane", "@example.com", "jane@", "jane@example", "ja ne@example.com", "a@b@c.com"] {
            let err = EmailAddress::parse(bad).expect_err("should reject malformed email");
            assert!(matches!(err, TextError::InvalidEmail(_)), "{bad}");
        }
        assert!(matches!(EmailAddress::parse(""), Err(TextError::Empty)));
    }

    #[test]
    fn email_deserialisation_validates() {
        let ok: EmailAddress = serde_json::from_str("\"user@example.com\"").expect("valid");
        assert_eq!(ok.as_str(), "user@example.com");

        let err = serde_json::from_str::<EmailAddress>("\"not-an-email\"");
        assert!(err.is_err());
    }

    #[test]
    fn opaque_id_accepts_foreign_formats() {
        for id in ["1", "pred-001", "k3j9x2", "550e8400-e29b-41d4-a716-446655440000"] {
            assert_eq!(OpaqueId::parse(id).expect("valid id").as_str(), id);
        }
        let from_json: OpaqueId = serde_json::from_str("\"pred-001\"").expect("valid");
        assert_eq!(from_json.to_string(), "pred-001");
    }

    #[test]
    fn opaque_id_rejects_values_unsafe_in_a_path() {
        assert!(matches!(OpaqueId::parse(""), Err(TextError::Empty)));
        for bad in ["a b", "a/b", "a?b", "a#b", "a\nb"] {
            let err = OpaqueId::parse(bad).expect_err("should reject");
            assert!(matches!(err, TextError::InvalidIdentifier(_)), "{bad:?}");
        }
        assert!(serde_json::from_str::<OpaqueId>("\"\"").is_err());
    }
}
