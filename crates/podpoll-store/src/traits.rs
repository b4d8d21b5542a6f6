use async_trait::async_trait;

use crate::access::AccessPolicy;
use crate::error::StoreResult;
use crate::resource::Resource;

/// Client for the remote resource protocol spoken by pods.
///
/// An implementation is bound to one caller's credentials and attaches them
/// to every request it issues. All implementations must satisfy:
/// - `get` on a missing resource returns `Ok(None)`.
/// - `put` is a full, idempotent replace.
/// - `create_container` on an existing container returns
///   [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists).
/// - No call retries or times out on its own.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Read a resource or container listing.
    async fn get(&self, url: &str) -> StoreResult<Option<Resource>>;

    /// Create or overwrite a (non-container) resource.
    async fn put(&self, url: &str, body: &str, content_type: &str) -> StoreResult<()>;

    /// Create a container. `url` must end with `/`.
    async fn create_container(&self, url: &str) -> StoreResult<()>;

    /// Replace the access-control policy attached to exactly `url`.
    async fn set_access(&self, url: &str, policy: &AccessPolicy) -> StoreResult<()>;
}
