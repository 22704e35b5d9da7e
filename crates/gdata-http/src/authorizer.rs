//! Authorizers for bearer tokens and API keys.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use gdata_core::error::AuthError;
use gdata_core::{Authorizer, Request};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::tokens::AccessToken;

/// Sends `Authorization: Bearer <token>` on behalf of one account.
///
/// The token can be swapped after a refresh; refreshing itself is up to the
/// caller.
pub struct BearerAuthorizer {
    identity: String,
    token: RwLock<AccessToken>,
}

impl BearerAuthorizer {
    /// `identity` is the account's email address, matched against entry
    /// authors for ownership checks.
    pub fn new(identity: impl Into<String>, token: AccessToken) -> Self {
        Self {
            identity: identity.into(),
            token: RwLock::new(token),
        }
    }

    /// Replace the token, e.g. after a refresh.
    pub fn set_token(&self, token: AccessToken) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
        debug!(identity = %self.identity, "access token replaced");
    }
}

impl fmt::Debug for BearerAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthorizer")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authorizer for BearerAuthorizer {
    async fn authorize(&self, request: Request) -> Result<Request, AuthError> {
        let header = {
            let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
            if token.is_expired() {
                warn!(identity = %self.identity, "access token expired");
                return Err(AuthError::CredentialsExpired);
            }
            format!("Bearer {}", token.as_str())
        };
        Ok(request.with_header("Authorization", header))
    }

    fn identity(&self) -> Option<&str> {
        Some(&self.identity)
    }
}

/// Appends `key=<api key>` to every request URI. Identifies the application,
/// not an account, so there is no identity.
#[derive(Clone)]
pub struct ApiKeyAuthorizer {
    key: String,
}

impl ApiKeyAuthorizer {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl fmt::Debug for ApiKeyAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKeyAuthorizer").field(&"[REDACTED]").finish()
    }
}

#[async_trait]
impl Authorizer for ApiKeyAuthorizer {
    async fn authorize(&self, mut request: Request) -> Result<Request, AuthError> {
        if self.key.is_empty() {
            return Err(AuthError::InvalidCredentials("API key is empty".to_string()));
        }
        let separator = if request.uri.contains('?') { '&' } else { '?' };
        let key: String = form_urlencoded::byte_serialize(self.key.as_bytes()).collect();
        request.uri = format!("{}{separator}key={key}", request.uri);
        Ok(request)
    }

    fn identity(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[tokio::test]
    async fn bearer_header() {
        let auth = BearerAuthorizer::new("ann@example.com", AccessToken::new("tok"));
        let request = auth.authorize(Request::get("https://x/feed")).await.unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer tok"));
        assert_eq!(auth.identity(), Some("ann@example.com"));
    }

    #[tokio::test]
    async fn expired_token_is_refused_until_replaced() {
        let past = SystemTime::now() - Duration::from_secs(1);
        let auth = BearerAuthorizer::new("ann@example.com", AccessToken::new("old").with_expiry(past));
        assert_eq!(
            auth.authorize(Request::get("https://x")).await,
            Err(AuthError::CredentialsExpired)
        );

        auth.set_token(AccessToken::new("new"));
        let request = auth.authorize(Request::get("https://x")).await.unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer new"));
    }

    #[tokio::test]
    async fn api_key_parameter() {
        let auth = ApiKeyAuthorizer::new("k&1");
        let request = auth.authorize(Request::get("https://x/q?query=a")).await.unwrap();
        assert_eq!(request.uri, "https://x/q?query=a&key=k%261");
        assert_eq!(auth.identity(), None);
        assert!(!format!("{auth:?}").contains("k&1"));
    }

    #[test]
    fn debug_hides_token() {
        let auth = BearerAuthorizer::new("ann@example.com", AccessToken::new("secret-token"));
        assert!(!format!("{auth:?}").contains("secret-token"));
    }
}
