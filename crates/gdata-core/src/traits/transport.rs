//! Transport trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{Request, Response};

/// Performs a request and returns whatever the server answered.
///
/// Non-2xx statuses are returned as responses, not errors; the service maps
/// them. Timeouts and retries are the implementation's business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn perform(&self, request: Request) -> Result<Response, TransportError> {
        (**self).perform(request).await
    }
}
