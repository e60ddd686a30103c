//! Opaque bearer credential for a mail provider.

use std::fmt;

/// A bearer access token supplied per scan.
///
/// The value is only ever used as an `Authorization` header; it is never
/// inspected, persisted, or printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use as a bearer header value.
    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
