//! Remote resource access for podpoll.
//!
//! A pod is an independently hosted, per-identity tree of containers and
//! resources. This crate speaks to pods through the [`ResourceClient`] trait
//! and builds the two storage primitives the record store needs on top of it:
//! idempotent container provisioning and best-effort access-control
//! propagation.
//!
//! # Protocol
//!
//! - `GET` reads a resource; a missing resource is `Ok(None)`, never an error.
//! - `PUT` fully replaces a resource.
//! - Container creation reports [`StoreError::AlreadyExists`] on conflict.
//! - Containers are addressed by URLs ending in `/`.
//! - Access control is a sidecar document at `<resource>.acl`.
//!
//! # Backends
//!
//! - [`HttpResourceClient`] -- `reqwest`-based client carrying caller credentials
//! - [`InMemoryPodServer`] / [`InMemoryClient`] -- multi-pod host for tests and
//!   embedding, enforcing owner and public grants
//!
//! # Design Rules
//!
//! 1. Every outbound request carries the caller's credentials; this crate
//!    never obtains or refreshes them.
//! 2. Ancestor containers are created before descendants.
//! 3. Access-control failures are recorded in [`Diagnostics`] and never
//!    interrupt the write they accompany.
//! 4. No request has a timeout at this layer; configure one on the
//!    underlying HTTP client.

pub mod access;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod memory;
pub mod provision;
pub mod resource;
pub mod traits;

pub use access::{AccessModes, AccessPolicy, AccessPropagator, Grant, Grantee, Visibility, ACL_SUFFIX};
pub use diagnostics::{Diagnostic, Diagnostics, SideEffect};
pub use error::{StoreError, StoreResult};
pub use http::{Credentials, HttpResourceClient};
pub use memory::{InMemoryClient, InMemoryPodServer};
pub use provision::ContainerProvisioner;
pub use resource::{is_container, parent_container, Resource};
pub use traits::ResourceClient;
