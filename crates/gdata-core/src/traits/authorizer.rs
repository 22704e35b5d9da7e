//! Authorizer trait.

use async_trait::async_trait;

use crate::error::AuthError;
use crate::request::Request;

/// Attaches credentials to outgoing requests.
///
/// Credential caching and refresh belong to the implementation.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns `request` with credentials attached.
    async fn authorize(&self, request: Request) -> Result<Request, AuthError>;

    /// Address of the authenticated account, if there is one.
    fn identity(&self) -> Option<&str>;
}

#[async_trait]
impl<A: Authorizer + ?Sized> Authorizer for std::sync::Arc<A> {
    async fn authorize(&self, request: Request) -> Result<Request, AuthError> {
        (**self).authorize(request).await
    }

    fn identity(&self) -> Option<&str> {
        (**self).identity()
    }
}
