//! Public lookup code embedded in each QR tag.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`UniqueCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UniqueCodeError {
    /// The input is empty or whitespace only.
    #[error("unique code cannot be empty")]
    Empty,
    /// The input is too long to be a code.
    #[error("unique code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Short opaque token identifying an owner in the public scan flow.
///
/// Generated codes are the first group of a random UUID v4: eight lowercase
/// hex characters. Codes supplied by callers are only trimmed and bounded,
/// so an arbitrary well-formed string simply fails to match any owner.
///
/// ```
/// use lost_found_core::UniqueCode;
///
/// let code = UniqueCode::generate();
/// assert_eq!(code.as_str().len(), UniqueCode::GENERATED_LENGTH);
/// assert_eq!(UniqueCode::parse(" 1a2b3c4d ").unwrap().as_str(), "1a2b3c4d");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct UniqueCode(String);

impl UniqueCode {
    /// Length of every generated code.
    pub const GENERATED_LENGTH: usize = 8;

    /// Maximum length accepted when parsing caller input.
    pub const MAX_LENGTH: usize = 64;

    /// Generate a fresh random code.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Derive a code from the first hyphen-separated group of a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        let hyphenated = uuid.hyphenated().to_string();
        let head = hyphenated.split('-').next().unwrap_or_default();
        Self(head.to_owned())
    }

    /// Parse a code supplied by a caller, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, UniqueCodeError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(UniqueCodeError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(UniqueCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code and returns the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UniqueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UniqueCode {
    type Err = UniqueCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UniqueCode {
    type Error = UniqueCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UniqueCode> for String {
    fn from(code: UniqueCode) -> Self {
        code.0
    }
}

impl AsRef<str> for UniqueCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let code = UniqueCode::generate();
        assert_eq!(code.as_str().len(), 8);
        assert!(
            code.as_str()
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_generate_differs() {
        assert_ne!(UniqueCode::generate(), UniqueCode::generate());
    }

    #[test]
    fn test_from_uuid_takes_first_group() {
        let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(UniqueCode::from_uuid(uuid).as_str(), "67e55044");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(UniqueCode::parse(""), Err(UniqueCodeError::Empty));
        assert_eq!(UniqueCode::parse("  "), Err(UniqueCodeError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        assert_eq!(
            UniqueCode::parse(&"z".repeat(65)),
            Err(UniqueCodeError::TooLong { max: 64 })
        );
    }

    #[test]
    fn test_parse_accepts_unknown_shapes() {
        // Not a generated shape, but still a lookup key
        assert_eq!(UniqueCode::parse("ZZZZZZZZ").unwrap().as_str(), "ZZZZZZZZ");
    }
}
