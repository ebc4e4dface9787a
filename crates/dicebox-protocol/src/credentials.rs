//! Decoding of `Authorization: Basic …` headers.
//!
//! The header value is `Basic ` followed by base64 of `username:password`.
//! Only the first `:` separates the two, so passwords may contain colons.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::ProtocolError;

const BASIC_PREFIX: &str = "Basic ";

/// A username/password pair taken from a Basic authorization header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses the value of an `Authorization` header.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCredentials`] if the scheme is not
    /// `Basic`, the payload is not base64, not UTF-8, or has no `:`.
    pub fn from_header(value: &str) -> Result<Self, ProtocolError> {
        let encoded = value.strip_prefix(BASIC_PREFIX).ok_or_else(|| {
            ProtocolError::InvalidCredentials("expected the Basic scheme".into())
        })?;

        let decoded = STANDARD.decode(encoded.trim()).map_err(|e| {
            ProtocolError::InvalidCredentials(format!("invalid base64: {e}"))
        })?;

        let decoded = String::from_utf8(decoded).map_err(|_| {
            ProtocolError::InvalidCredentials("credentials are not UTF-8".into())
        })?;

        let (username, password) = decoded.split_once(':').ok_or_else(|| {
            ProtocolError::InvalidCredentials("missing ':' separator".into())
        })?;

        Ok(Self::new(username, password))
    }

    /// Builds the header value a client sends for these credentials.
    pub fn to_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("{BASIC_PREFIX}{}", STANDARD.encode(raw))
    }
}

// Never print the password.
impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_valid_returns_pair() {
        // "u1:p1"
        let creds = BasicCredentials::from_header("Basic dTE6cDE=").unwrap();

        assert_eq!(creds.username, "u1");
        assert_eq!(creds.password, "p1");
    }

    #[test]
    fn test_from_header_password_with_colon_keeps_remainder() {
        let header = BasicCredentials::new("alice", "a:b:c").to_header();

        let creds = BasicCredentials::from_header(&header).unwrap();

        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn test_from_header_wrong_scheme_returns_error() {
        let result = BasicCredentials::from_header("Bearer dTE6cDE=");

        assert!(matches!(result, Err(ProtocolError::InvalidCredentials(_))));
    }

    #[test]
    fn test_from_header_bad_base64_returns_error() {
        let result = BasicCredentials::from_header("Basic !!!not-base64");

        assert!(matches!(result, Err(ProtocolError::InvalidCredentials(_))));
    }

    #[test]
    fn test_from_header_missing_separator_returns_error() {
        // "nocolon"
        let result = BasicCredentials::from_header("Basic bm9jb2xvbg==");

        assert!(matches!(result, Err(ProtocolError::InvalidCredentials(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = BasicCredentials::new("u1", "hunter2");

        let printed = format!("{creds:?}");

        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("u1"));
    }
}
