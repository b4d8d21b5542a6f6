//! Access-control policies and their propagation onto new resources.
//!
//! Public grants are scoped to exactly one resource (`acl:accessTo`), so
//! granting public read on a poll file does not expose siblings or
//! descendants. Only the owner's own authorization on a container is
//! inherited (`acl:default`).

use std::fmt::Write as _;
use std::sync::Arc;

use podpoll_types::Identity;

use crate::diagnostics::{Diagnostics, SideEffect};
use crate::resource::is_container;
use crate::traits::ResourceClient;

/// Suffix appended to a resource URL to address its access-control sidecar.
pub const ACL_SUFFIX: &str = ".acl";

/// Independent read/write bits of a grant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessModes {
    pub read: bool,
    pub write: bool,
}

impl AccessModes {
    pub const NONE: Self = Self { read: false, write: false };
    pub const READ: Self = Self { read: true, write: false };
    pub const WRITE_ONLY: Self = Self { read: false, write: true };
    pub const READ_WRITE: Self = Self { read: true, write: true };

    pub fn covers(&self, required: AccessModes) -> bool {
        (!required.read || self.read) && (!required.write || self.write)
    }
}

/// Who a grant applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Grantee {
    /// A single agent, identified by its identity URL.
    Agent(Identity),
    /// Any requester, authenticated or not.
    Public,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub grantee: Grantee,
    pub modes: AccessModes,
}

/// The full policy attached to one resource.
///
/// The owner always keeps read, write and control; additional grants are
/// listed in `grants`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPolicy {
    pub owner: Identity,
    pub grants: Vec<Grant>,
}

impl AccessPolicy {
    /// Owner-only policy.
    pub fn private(owner: Identity) -> Self {
        Self {
            owner,
            grants: Vec::new(),
        }
    }

    /// Owner plus a public grant with the given modes.
    pub fn public(owner: Identity, modes: AccessModes) -> Self {
        Self {
            owner,
            grants: vec![Grant {
                grantee: Grantee::Public,
                modes,
            }],
        }
    }

    /// Whether `agent` (or an anonymous requester, for `None`) holds `required`.
    pub fn allows(&self, agent: Option<&Identity>, required: AccessModes) -> bool {
        if agent == Some(&self.owner) {
            return true;
        }
        self.grants.iter().any(|grant| {
            let applies = match &grant.grantee {
                Grantee::Public => true,
                Grantee::Agent(id) => agent == Some(id),
            };
            applies && grant.modes.covers(required)
        })
    }

    /// Render as a WAC Turtle document governing `resource_url`.
    ///
    /// On a container the owner's authorization is also the default for its
    /// members, since a sidecar on a container replaces whatever the members
    /// would otherwise inherit. Other grants apply to the resource only.
    pub fn to_turtle(&self, resource_url: &str) -> String {
        let mut doc = String::from(
            "@prefix acl: <http://www.w3.org/ns/auth/acl#>.\n@prefix foaf: <http://xmlns.com/foaf/0.1/>.\n",
        );
        let owner_scope = if is_container(resource_url) {
            format!("acl:accessTo <{resource_url}>;\n    acl:default <{resource_url}>")
        } else {
            format!("acl:accessTo <{resource_url}>")
        };
        write_authorization(
            &mut doc,
            "owner",
            &format!("acl:agent <{}>", self.owner),
            &owner_scope,
            "acl:Read, acl:Write, acl:Control",
        );
        for (index, grant) in self.grants.iter().enumerate() {
            let modes = mode_list(grant.modes);
            if modes.is_empty() {
                continue;
            }
            let (label, subject) = match &grant.grantee {
                Grantee::Public => ("public".to_string(), "acl:agentClass foaf:Agent".to_string()),
                Grantee::Agent(id) => (format!("agent{index}"), format!("acl:agent <{id}>")),
            };
            write_authorization(&mut doc, &label, &subject, &format!("acl:accessTo <{resource_url}>"), &modes);
        }
        doc
    }
}

fn mode_list(modes: AccessModes) -> String {
    let mut out = Vec::new();
    if modes.read {
        out.push("acl:Read");
    }
    if modes.write {
        out.push("acl:Write");
    }
    out.join(", ")
}

fn write_authorization(doc: &mut String, label: &str, subject: &str, scope: &str, modes: &str) {
    // Writing into a String cannot fail.
    let _ = write!(
        doc,
        "\n<#{label}>\n    a acl:Authorization;\n    {subject};\n    {scope};\n    acl:mode {modes}.\n"
    );
}

/// The two visibility profiles applied to poll data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Polls, statements and votes: anyone holding the poll id may read.
    PublicRead,
    /// The participant registry: any contributor may register itself.
    PublicReadWrite,
}

impl Visibility {
    pub fn modes(&self) -> AccessModes {
        match self {
            Self::PublicRead => AccessModes::READ,
            Self::PublicReadWrite => AccessModes::READ_WRITE,
        }
    }
}

/// Best-effort access-control propagation.
///
/// Failures are recorded in [`Diagnostics`] and never returned.
pub struct AccessPropagator {
    client: Arc<dyn ResourceClient>,
    diagnostics: Diagnostics,
}

impl AccessPropagator {
    pub fn new(client: Arc<dyn ResourceClient>, diagnostics: Diagnostics) -> Self {
        Self { client, diagnostics }
    }

    /// Attach `visibility` for `owner`'s resource at `url`.
    ///
    /// Returns `true` if the policy was applied.
    pub async fn set_visibility(&self, url: &str, owner: &Identity, visibility: Visibility) -> bool {
        let policy = AccessPolicy::public(owner.clone(), visibility.modes());
        match self.client.set_access(url, &policy).await {
            Ok(()) => {
                tracing::debug!(url, ?visibility, "visibility applied");
                true
            }
            Err(e) => {
                self.diagnostics.record(SideEffect::Visibility, url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    #[test]
    fn owner_always_allowed() {
        let owner = ident("https://alice.example/profile/card#me");
        let policy = AccessPolicy::private(owner.clone());
        assert!(policy.allows(Some(&owner), AccessModes::READ_WRITE));
        assert!(!policy.allows(None, AccessModes::READ));
    }

    #[test]
    fn public_read_does_not_grant_write() {
        let owner = ident("https://alice.example/profile/card#me");
        let bob = ident("https://bob.example/profile/card#me");
        let policy = AccessPolicy::public(owner, Visibility::PublicRead.modes());
        assert!(policy.allows(Some(&bob), AccessModes::READ));
        assert!(policy.allows(None, AccessModes::READ));
        assert!(!policy.allows(Some(&bob), AccessModes::READ_WRITE));
    }

    #[test]
    fn agent_grant_is_specific() {
        let owner = ident("https://alice.example/profile/card#me");
        let bob = ident("https://bob.example/profile/card#me");
        let carol = ident("https://carol.example/profile/card#me");
        let policy = AccessPolicy {
            owner,
            grants: vec![Grant {
                grantee: Grantee::Agent(bob.clone()),
                modes: AccessModes::READ_WRITE,
            }],
        };
        assert!(policy.allows(Some(&bob), AccessModes::READ_WRITE));
        assert!(!policy.allows(Some(&carol), AccessModes::READ));
    }

    #[test]
    fn turtle_scopes_to_resource_only() {
        let owner = ident("https://alice.example/profile/card#me");
        let policy = AccessPolicy::public(owner, Visibility::PublicReadWrite.modes());
        let doc = policy.to_turtle("https://alice.example/polis/polls/p1/participants.json");

        assert!(doc.contains("acl:agent <https://alice.example/profile/card#me>"));
        assert!(doc.contains("acl:agentClass foaf:Agent"));
        assert!(doc.contains("acl:mode acl:Read, acl:Write."));
        assert!(doc.contains("acl:accessTo <https://alice.example/polis/polls/p1/participants.json>"));
        assert!(!doc.contains("acl:default"));
    }

    #[test]
    fn container_sidecar_keeps_owner_inheritance() {
        let owner = ident("https://carol.example/profile/card#me");
        let container = "https://carol.example/polis/polls/p1/";
        let doc = AccessPolicy::public(owner, Visibility::PublicRead.modes()).to_turtle(container);

        let (owner_rule, public_rule) = doc.split_once("<#public>").unwrap();
        assert!(owner_rule.contains("acl:agent <https://carol.example/profile/card#me>"));
        assert!(owner_rule.contains(&format!("acl:default <{container}>")));
        assert!(owner_rule.contains(&format!("acl:accessTo <{container}>")));
        assert!(public_rule.contains(&format!("acl:accessTo <{container}>")));
        assert!(!public_rule.contains("acl:default"));
        assert_eq!(doc.matches("acl:default").count(), 1);
    }

    #[test]
    fn empty_grants_are_omitted() {
        let owner = ident("https://alice.example/profile/card#me");
        let policy = AccessPolicy::public(owner, AccessModes::NONE);
        let doc = policy.to_turtle("https://alice.example/x.json");
        assert!(!doc.contains("foaf:Agent;"));
    }
}
