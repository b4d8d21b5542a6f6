//! Identity → storage root resolution.
//!
//! Resolution tries, in order, and caches the first result:
//! 1. storage roots declared in the identity's public profile,
//! 2. a provider rule matching the identity's host,
//! 3. the identity's own origin.
//!
//! The cache lives for the lifetime of the resolver and is never invalidated;
//! an identity that migrates providers mid-session keeps resolving to its old
//! root until the process restarts.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use podpoll_store::ResourceClient;
use podpoll_types::Identity;
use regex::Regex;
use reqwest::Url;

use crate::config::ProviderRule;
use crate::error::{PollError, PollResult};

static STORAGE_PREDICATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<http://www\.w3\.org/ns/pim/space#storage>|\b(?:pim|space):storage)\s+((?:<[^>\s]*>\s*,?\s*)+)")
        .expect("valid storage predicate regex")
});

static IRI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^>\s]*)>").expect("valid IRI regex"));

/// Extract declared storage roots from a Turtle identity document.
///
/// Relative IRIs are resolved against `document_url`. Order of appearance
/// is preserved.
pub fn declared_storage(document: &str, document_url: &str) -> Vec<String> {
    let base = Url::parse(document_url).ok();
    let mut roots = Vec::new();
    for objects in STORAGE_PREDICATE.captures_iter(document) {
        for object in IRI.captures_iter(&objects[1]) {
            let raw = &object[1];
            let resolved = match &base {
                Some(base) => base.join(raw).map(String::from).ok(),
                None => Url::parse(raw).map(String::from).ok(),
            };
            if let Some(root) = resolved {
                roots.push(with_trailing_slash(root));
            }
        }
    }
    roots
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Cached identity → storage root resolver.
pub struct LocationResolver {
    client: Arc<dyn ResourceClient>,
    rules: Vec<ProviderRule>,
    cache: RwLock<HashMap<Identity, String>>,
}

impl LocationResolver {
    pub fn new(client: Arc<dyn ResourceClient>, rules: Vec<ProviderRule>) -> Self {
        Self {
            client,
            rules,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `identity` to its storage root (always ending in `/`).
    ///
    /// Fails only if the identity is not a well-formed URL with a host.
    pub async fn resolve(&self, identity: &Identity) -> PollResult<String> {
        if let Some(root) = self.cached(identity) {
            tracing::trace!(%identity, root = %root, "storage root from cache");
            return Ok(root);
        }

        let url = Url::parse(identity.as_str()).map_err(|e| PollError::InvalidIdentity {
            identity: identity.to_string(),
            reason: e.to_string(),
        })?;
        let host = url.host_str().ok_or_else(|| PollError::InvalidIdentity {
            identity: identity.to_string(),
            reason: "identity has no host".into(),
        })?;

        let root = match self.from_profile(identity).await {
            Some(root) => root,
            None => match self.from_provider_rule(&url) {
                Some(root) => {
                    tracing::debug!(%identity, root = %root, "storage root from provider rule");
                    root
                }
                None => {
                    let origin = match url.port() {
                        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
                        None => format!("{}://{}/", url.scheme(), host),
                    };
                    tracing::warn!(%identity, root = %origin, "falling back to identity origin as storage root");
                    origin
                }
            },
        };

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.clone(), root.clone());
        Ok(root)
    }

    /// Number of cached identities.
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn cached(&self, identity: &Identity) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    async fn from_profile(&self, identity: &Identity) -> Option<String> {
        let document_url = identity.document_url();
        match self.client.get(document_url).await {
            Ok(Some(document)) => {
                let root = declared_storage(&document.body, document_url).into_iter().next();
                match &root {
                    Some(root) => tracing::debug!(%identity, root = %root, "storage root from profile"),
                    None => tracing::debug!(%identity, "profile declares no storage"),
                }
                root
            }
            Ok(None) => {
                tracing::debug!(%identity, "profile document not found");
                None
            }
            Err(e) => {
                tracing::warn!(%identity, error = %e, "profile lookup failed");
                None
            }
        }
    }

    fn from_provider_rule(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        let rule = self.rules.iter().find(|r| r.identity_host.eq_ignore_ascii_case(host))?;
        let account = url.path_segments()?.find(|s| !s.is_empty())?;
        Some(with_trailing_slash(rule.storage_for(account)))
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("rules", &self.rules)
            .field("cached", &self.cached_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use podpoll_store::InMemoryPodServer;

    fn ident(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn resolver(server: &Arc<InMemoryPodServer>) -> LocationResolver {
        LocationResolver::new(
            Arc::new(server.anonymous_client()),
            StorageConfig::default().provider_rules,
        )
    }

    #[test]
    fn parses_prefixed_and_full_predicates() {
        let doc = r#"
            @prefix pim: <http://www.w3.org/ns/pim/space#>.
            <#me> pim:storage <https://pod.example/alice/>, <https://backup.example/alice/>.
        "#;
        assert_eq!(
            declared_storage(doc, "https://id.example/alice/profile/card"),
            vec!["https://pod.example/alice/", "https://backup.example/alice/"]
        );

        let doc = "<#me> <http://www.w3.org/ns/pim/space#storage> </storage>.";
        assert_eq!(
            declared_storage(doc, "https://id.example/alice/profile/card"),
            vec!["https://id.example/storage/"]
        );

        assert!(declared_storage("<#me> a <http://xmlns.com/foaf/0.1/Person>.", "https://x/").is_empty());
    }

    #[tokio::test]
    async fn profile_storage_wins() {
        let server = Arc::new(InMemoryPodServer::new());
        let alice = ident("https://id.inrupt.com/alice/profile/card#me");
        server.publish_profile(
            &alice,
            "<#me> <http://www.w3.org/ns/pim/space#storage> <https://elsewhere.example/alice-pod>.",
        );
        let root = resolver(&server).resolve(&alice).await.unwrap();
        assert_eq!(root, "https://elsewhere.example/alice-pod/");
    }

    #[tokio::test]
    async fn provider_rule_when_profile_missing() {
        let server = Arc::new(InMemoryPodServer::new());
        let alice = ident("https://id.inrupt.com/alice/profile/card#me");
        let root = resolver(&server).resolve(&alice).await.unwrap();
        assert_eq!(root, "https://storage.inrupt.com/alice/");
    }

    #[tokio::test]
    async fn origin_fallback_keeps_port() {
        let server = Arc::new(InMemoryPodServer::new());
        let bob = ident("http://localhost:3000/bob/profile/card#me");
        let root = resolver(&server).resolve(&bob).await.unwrap();
        assert_eq!(root, "http://localhost:3000/");
    }

    #[tokio::test]
    async fn malformed_identity_fails() {
        let server = Arc::new(InMemoryPodServer::new());
        let err = resolver(&server).resolve(&ident("not a url")).await.unwrap_err();
        assert!(matches!(err, PollError::InvalidIdentity { .. }));
    }

    #[tokio::test]
    async fn results_are_cached_and_never_invalidated() {
        let server = Arc::new(InMemoryPodServer::new());
        let alice = ident("https://id.example/alice/profile/card#me");
        let resolver = resolver(&server);
        assert_eq!(resolver.resolve(&alice).await.unwrap(), "https://id.example/");
        assert_eq!(resolver.cached_len(), 1);

        server.publish_profile(
            &alice,
            "<#me> <http://www.w3.org/ns/pim/space#storage> <https://new.example/alice/>.",
        );
        assert_eq!(resolver.resolve(&alice).await.unwrap(), "https://id.example/");
    }
}
