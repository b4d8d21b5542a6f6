use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use podpoll_types::Identity;

use crate::access::{AccessModes, AccessPolicy};
use crate::error::{StoreError, StoreResult};
use crate::resource::{is_container, parent_container, Resource};
use crate::traits::ResourceClient;

#[derive(Debug)]
struct Pod {
    owner: Identity,
    online: bool,
    reject_access_control: bool,
}

#[derive(Debug, Default)]
struct HostState {
    /// Pod storage roots, each ending in `/`.
    pods: BTreeMap<String, Pod>,
    containers: BTreeSet<String>,
    resources: HashMap<String, Resource>,
    policies: HashMap<String, AccessPolicy>,
    /// Identity documents, served publicly and independently of pods.
    profiles: HashMap<String, String>,
}

impl HostState {
    fn pod_for(&self, url: &str) -> StoreResult<&Pod> {
        let (_, pod) = self
            .pods
            .iter()
            .filter(|(root, _)| url.starts_with(root.as_str()))
            .max_by_key(|(root, _)| root.len())
            .ok_or_else(|| StoreError::unavailable(url, "no pod hosts this URL"))?;
        if !pod.online {
            return Err(StoreError::unavailable(url, "pod offline"));
        }
        Ok(pod)
    }

    fn authorize(&self, url: &str, agent: Option<&Identity>, required: AccessModes) -> StoreResult<()> {
        let pod = self.pod_for(url)?;
        if agent == Some(&pod.owner) {
            return Ok(());
        }
        match self.policies.get(url) {
            Some(policy) if policy.allows(agent, required) => Ok(()),
            _ => Err(StoreError::Forbidden(url.to_string())),
        }
    }

    fn exists(&self, url: &str) -> bool {
        self.containers.contains(url) || self.resources.contains_key(url)
    }

    fn listing(&self, container: &str) -> String {
        let children = self
            .containers
            .iter()
            .map(String::as_str)
            .chain(self.resources.keys().map(String::as_str))
            .filter(|child| *child != container && parent_container(child) == Some(container));
        let mut lines: Vec<String> = children
            .map(|child| format!("<> <http://www.w3.org/ns/ldp#contains> <{child}>."))
            .collect();
        lines.sort();
        let mut doc = String::from("<> a <http://www.w3.org/ns/ldp#BasicContainer>.\n");
        for line in lines {
            doc.push_str(&line);
            doc.push('\n');
        }
        doc
    }
}

/// In-memory host for any number of pods.
///
/// Intended for tests and embedding. Enforces the parts of pod semantics the
/// record store relies on: parents must exist before children, the pod owner
/// may do anything, and everyone else needs an explicit grant on the exact
/// resource. Pods can be taken offline to simulate unreachable stores.
pub struct InMemoryPodServer {
    state: RwLock<HostState>,
}

impl InMemoryPodServer {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HostState::default()),
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, HostState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, HostState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Host a pod at `root` (which must end in `/`) owned by `owner`.
    pub fn add_pod(&self, root: &str, owner: Identity) {
        let mut state = self.write_state();
        state.containers.insert(root.to_string());
        state.pods.insert(
            root.to_string(),
            Pod {
                owner,
                online: true,
                reject_access_control: false,
            },
        );
    }

    /// Serve `body` as the identity document of `identity`.
    pub fn publish_profile(&self, identity: &Identity, body: impl Into<String>) {
        self.write_state()
            .profiles
            .insert(identity.document_url().to_string(), body.into());
    }

    pub fn set_online(&self, root: &str, online: bool) {
        if let Some(pod) = self.write_state().pods.get_mut(root) {
            pod.online = online;
        }
    }

    /// Make every access-control update on this pod fail.
    pub fn reject_access_control(&self, root: &str, reject: bool) {
        if let Some(pod) = self.write_state().pods.get_mut(root) {
            pod.reject_access_control = reject;
        }
    }

    /// A client acting as `agent`.
    pub fn client_for(self: &Arc<Self>, agent: Identity) -> InMemoryClient {
        InMemoryClient {
            server: Arc::clone(self),
            agent: Some(agent),
        }
    }

    /// A client with no credentials.
    pub fn anonymous_client(self: &Arc<Self>) -> InMemoryClient {
        InMemoryClient {
            server: Arc::clone(self),
            agent: None,
        }
    }

    pub fn resource(&self, url: &str) -> Option<Resource> {
        self.read_state().resources.get(url).cloned()
    }

    pub fn policy(&self, url: &str) -> Option<AccessPolicy> {
        self.read_state().policies.get(url).cloned()
    }

    pub fn has_container(&self, url: &str) -> bool {
        self.read_state().containers.contains(url)
    }

    pub fn container_count(&self) -> usize {
        self.read_state().containers.len()
    }
}

impl Default for InMemoryPodServer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryPodServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("InMemoryPodServer")
            .field("pods", &state.pods.len())
            .field("containers", &state.containers.len())
            .field("resources", &state.resources.len())
            .finish()
    }
}

/// A [`ResourceClient`] bound to one agent on an [`InMemoryPodServer`].
#[derive(Clone, Debug)]
pub struct InMemoryClient {
    server: Arc<InMemoryPodServer>,
    agent: Option<Identity>,
}

impl InMemoryClient {
    pub fn agent(&self) -> Option<&Identity> {
        self.agent.as_ref()
    }
}

#[async_trait]
impl ResourceClient for InMemoryClient {
    async fn get(&self, url: &str) -> StoreResult<Option<Resource>> {
        let state = self.server.read_state();
        if let Some(profile) = state.profiles.get(url) {
            return Ok(Some(Resource::new(profile.clone(), "text/turtle")));
        }
        state.pod_for(url)?;
        if !state.exists(url) {
            return Ok(None);
        }
        state.authorize(url, self.agent.as_ref(), AccessModes::READ)?;
        if state.containers.contains(url) {
            return Ok(Some(Resource::new(state.listing(url), "text/turtle")));
        }
        Ok(state.resources.get(url).cloned())
    }

    async fn put(&self, url: &str, body: &str, content_type: &str) -> StoreResult<()> {
        if is_container(url) {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        let mut state = self.server.write_state();
        state.authorize(url, self.agent.as_ref(), AccessModes::WRITE_ONLY)?;
        let parent_exists = parent_container(url).is_some_and(|p| state.containers.contains(p));
        if !parent_exists {
            return Err(StoreError::ParentMissing(url.to_string()));
        }
        state
            .resources
            .insert(url.to_string(), Resource::new(body, content_type));
        Ok(())
    }

    async fn create_container(&self, url: &str) -> StoreResult<()> {
        if !is_container(url) {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        let mut state = self.server.write_state();
        state.authorize(url, self.agent.as_ref(), AccessModes::WRITE_ONLY)?;
        if state.exists(url) {
            return Err(StoreError::AlreadyExists(url.to_string()));
        }
        let parent_exists = parent_container(url).is_some_and(|p| state.containers.contains(p));
        if !parent_exists {
            return Err(StoreError::ParentMissing(url.to_string()));
        }
        state.containers.insert(url.to_string());
        Ok(())
    }

    async fn set_access(&self, url: &str, policy: &AccessPolicy) -> StoreResult<()> {
        let mut state = self.server.write_state();
        let pod = state.pod_for(url)?;
        if self.agent.as_ref() != Some(&pod.owner) {
            return Err(StoreError::Forbidden(format!("{url}{}", crate::access::ACL_SUFFIX)));
        }
        if pod.reject_access_control {
            return Err(StoreError::Status {
                url: format!("{url}{}", crate::access::ACL_SUFFIX),
                status: 500,
            });
        }
        if !state.exists(url) {
            return Err(StoreError::Status {
                url: url.to_string(),
                status: 404,
            });
        }
        state.policies.insert(url.to_string(), policy.clone());
        Ok(())
    }
}
