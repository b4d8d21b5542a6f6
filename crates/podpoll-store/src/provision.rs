use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::resource::{is_container, parent_container};
use crate::traits::ResourceClient;

/// Idempotent container creation.
///
/// Remote stores may reject writes into a container whose parent does not
/// exist, so chains are always created strictly top-down.
pub struct ContainerProvisioner {
    client: Arc<dyn ResourceClient>,
}

impl ContainerProvisioner {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self { client }
    }

    /// Ensure one container exists. A conflict means it already does.
    pub async fn ensure(&self, container_url: &str) -> StoreResult<()> {
        if !is_container(container_url) {
            return Err(StoreError::InvalidUrl(container_url.to_string()));
        }
        match self.client.create_container(container_url).await {
            Ok(()) => {
                tracing::debug!(container = container_url, "container created");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(container = container_url, "container already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Ensure every container from just below `root` down to `target`.
    ///
    /// `root` itself is assumed to exist (it is the pod's storage root).
    pub async fn ensure_chain(&self, root: &str, target: &str) -> StoreResult<()> {
        for container in Self::chain(root, target)? {
            self.ensure(&container).await?;
        }
        Ok(())
    }

    /// The containers strictly below `root` leading to `target`, top-down.
    pub fn chain(root: &str, target: &str) -> StoreResult<Vec<String>> {
        if !is_container(root) || !is_container(target) || !target.starts_with(root) {
            return Err(StoreError::InvalidUrl(target.to_string()));
        }
        let mut chain = Vec::new();
        let mut current = target;
        while current.len() > root.len() {
            chain.push(current.to_string());
            current = match parent_container(current) {
                Some(parent) => parent,
                None => break,
            };
        }
        chain.reverse();
        Ok(chain)
    }
}
