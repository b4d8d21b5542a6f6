use std::sync::Arc;

use chrono::Utc;
use podpoll_store::{
    AccessPropagator, ContainerProvisioner, Diagnostics, ResourceClient, SideEffect, Visibility,
};
use podpoll_types::{Identity, NewPoll, Poll, PollId};

use crate::collection;
use crate::config::StorageConfig;
use crate::error::{PollError, PollResult};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::layout::PodLayout;
use crate::locate::LocationResolver;

/// Poll storage spread across participants' pods.
///
/// One `PollStorage` is bound to one caller's credentials (through its
/// [`ResourceClient`]). Reads may target anyone's pod; writes succeed only
/// where those credentials are granted access: the caller's own pod, plus
/// participant registries opened for public write.
pub struct PollStorage {
    pub(crate) client: Arc<dyn ResourceClient>,
    pub(crate) config: StorageConfig,
    pub(crate) resolver: LocationResolver,
    pub(crate) provisioner: ContainerProvisioner,
    pub(crate) access: AccessPropagator,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) ids: Arc<dyn IdGenerator>,
}

impl PollStorage {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self::with_config(client, StorageConfig::default())
    }

    pub fn with_config(client: Arc<dyn ResourceClient>, config: StorageConfig) -> Self {
        let diagnostics = Diagnostics::new();
        Self {
            resolver: LocationResolver::new(Arc::clone(&client), config.provider_rules.clone()),
            provisioner: ContainerProvisioner::new(Arc::clone(&client)),
            access: AccessPropagator::new(Arc::clone(&client), diagnostics.clone()),
            diagnostics,
            ids: Arc::new(UuidGenerator),
            config,
            client,
        }
    }

    /// Replace the identifier source.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Failures of best-effort side effects (visibility, registration, index).
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Storage root of `identity`.
    pub async fn storage_root(&self, identity: &Identity) -> PollResult<String> {
        self.resolver.resolve(identity).await
    }

    pub(crate) async fn layout(&self, identity: &Identity) -> PollResult<PodLayout<'_>> {
        let root = self.resolver.resolve(identity).await?;
        Ok(PodLayout::new(root, &self.config))
    }

    pub(crate) fn new_id(&self) -> String {
        self.ids.generate()
    }

    /// Create a poll in `creator`'s pod.
    ///
    /// Provisions the container chain, writes the poll, then best-effort:
    /// public read on the poll, a participant registry seeded with the
    /// creator (public read and write), public read on the poll container, and
    /// an entry in the creator's poll index. Only failures before the poll is
    /// written are returned.
    pub async fn create_poll(&self, creator: &Identity, fields: NewPoll) -> PollResult<Poll> {
        let layout = self.layout(creator).await?;
        let id = PollId::new(self.new_id());
        let mut poll = Poll::create(id.clone(), creator.clone(), fields, Utc::now());
        poll.participants_url = Some(layout.participants(&id));

        let container = layout.poll_container(&id);
        self.provisioner.ensure_chain(layout.root(), &container).await?;

        let poll_url = layout.poll(&id);
        let body = serde_json::to_string(&poll).map_err(|e| PollError::Encode(e.to_string()))?;
        self.client.put(&poll_url, &body, collection::JSON).await?;
        tracing::info!(poll = %id, creator = %creator, url = %poll_url, "poll created");

        self.access.set_visibility(&poll_url, creator, Visibility::PublicRead).await;

        // The registry is seeded while the container still inherits the pod's
        // defaults; its own sidecar follows.
        let participants_url = layout.participants(&id);
        match collection::write(self.client.as_ref(), &participants_url, std::slice::from_ref(creator)).await {
            Ok(()) => {
                self.access
                    .set_visibility(&participants_url, creator, Visibility::PublicReadWrite)
                    .await;
            }
            Err(e) => self
                .diagnostics
                .record(SideEffect::ParticipantRegistration, &participants_url, e),
        }
        self.access.set_visibility(&container, creator, Visibility::PublicRead).await;

        self.index_poll(&layout, creator, &id).await;
        Ok(poll)
    }

    /// Read poll metadata from `creator`'s pod.
    ///
    /// `Ok(None)` if absent, unreadable or malformed (the failure is logged).
    /// Only a malformed identity is an error.
    pub async fn get_poll(&self, creator: &Identity, poll: &PollId) -> PollResult<Option<Poll>> {
        let url = self.layout(creator).await?.poll(poll);
        let found = self.fetch_poll(&url).await;
        Ok(collection::absent_on_failure(&url, found))
    }

    async fn fetch_poll(&self, url: &str) -> PollResult<Option<Poll>> {
        let Some(resource) = self.client.get(url).await? else {
            return Ok(None);
        };
        if resource.is_blank() {
            return Ok(None);
        }
        serde_json::from_str(&resource.body)
            .map(Some)
            .map_err(|e| PollError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Resolve the caller's root, ensure the poll container exists there and
    /// return the layout.
    pub(crate) async fn prepare_own_poll(&self, identity: &Identity, poll: &PollId) -> PollResult<PodLayout<'_>> {
        let layout = self.layout(identity).await?;
        self.provisioner
            .ensure_chain(layout.root(), &layout.poll_container(poll))
            .await?;
        Ok(layout)
    }
}

impl std::fmt::Debug for PollStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollStorage")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}
