//! Messaging destination identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ChatId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatIdError {
    /// The input string is empty.
    #[error("chat id cannot be empty")]
    Empty,
    /// The input is longer than any destination the messaging API accepts.
    #[error("chat id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is neither a numeric id nor an `@username`.
    #[error("chat id must be numeric or start with @")]
    InvalidFormat,
}

/// An opaque destination for text and document messages.
///
/// ## Constraints
///
/// - Numeric id, optionally negative (groups and channels): `123456`, `-100987`
/// - Or a public username: `@boutique_orders`
///
/// ## Examples
///
/// ```
/// use boutique_core::ChatId;
///
/// assert!(ChatId::parse("123456789").is_ok());
/// assert!(ChatId::parse("-1001234567890").is_ok());
/// assert!(ChatId::parse("@boutique").is_ok());
///
/// assert!(ChatId::parse("").is_err());
/// assert!(ChatId::parse("12ab").is_err());
/// assert!(ChatId::parse("@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ChatId(String);

impl ChatId {
    /// Maximum length of a destination identifier.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `ChatId` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is longer than 64 characters
    /// - Is neither a (possibly negative) integer nor an `@username`
    pub fn parse(s: &str) -> Result<Self, ChatIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ChatIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ChatIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let valid = if let Some(username) = s.strip_prefix('@') {
            !username.is_empty()
                && username
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        } else {
            let digits = s.strip_prefix('-').unwrap_or(s);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        };

        if !valid {
            return Err(ChatIdError::InvalidFormat);
        }

        Ok(Self(s.to_owned()))
    }

    /// Build a `ChatId` from a numeric user id.
    #[must_use]
    pub fn from_user_id(id: i64) -> Self {
        Self(id.to_string())
    }

    /// Returns the destination as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ChatId {
    type Err = ChatIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChatId {
    type Error = ChatIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChatId> for String {
    fn from(id: ChatId) -> Self {
        id.0
    }
}
