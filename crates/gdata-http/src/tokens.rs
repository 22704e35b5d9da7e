//! Token types.

use std::fmt;
use std::time::SystemTime;

/// An OAuth access token, sent as a bearer credential.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Option<SystemTime>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            value: token.into(),
            expires_at: None,
        }
    }

    /// The token stops being sent once `expires_at` has passed.
    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| t <= SystemTime::now())
    }

    /// Returns the token value for use in authorization headers.
    pub(crate) fn as_str(&self) -> &str {
        &self.value
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn access_token_hides_value_in_debug() {
        let token = AccessToken::new("ya29.a0AfH6SMBx");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("ya29"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn expiry() {
        assert!(!AccessToken::new("t").is_expired());

        let past = SystemTime::now() - Duration::from_secs(60);
        assert!(AccessToken::new("t").with_expiry(past).is_expired());

        let future = SystemTime::now() + Duration::from_secs(3600);
        assert!(!AccessToken::new("t").with_expiry(future).is_expired());
    }
}
