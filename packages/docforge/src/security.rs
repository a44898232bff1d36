//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate so provider credentials never leak into logs,
//! debug output, or error messages.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A provider API credential that won't be logged or displayed.
pub struct ApiCredential(SecretBox<str>);

impl ApiCredential {
    /// Wrap a raw secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value.
    ///
    /// Only call this at the point of use: an authorization header, or a
    /// persistence write the user asked for.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the credential is the empty string.
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl Clone for ApiCredential {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for ApiCredential {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiCredential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
