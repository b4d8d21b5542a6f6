//! Decentralized poll storage over personal data pods.
//!
//! Every participant keeps their own contributions in their own pod; the poll
//! creator's pod additionally holds the poll metadata, a participant
//! registry and an index of created polls. [`PollStorage`] ties together:
//!
//! - [`LocationResolver`]: identity to storage root, cached
//! - container provisioning and access propagation from `podpoll-store`
//! - per-identity statement and vote collections (read-modify-write JSON)
//! - the participant registry in the creator's pod
//! - concurrent aggregation across participants that tolerates dead pods
//!
//! ```no_run
//! # async fn demo() -> podpoll_engine::PollResult<()> {
//! use std::sync::Arc;
//! use podpoll_engine::{Credentials, HttpResourceClient, Identity, NewPoll, PollStorage};
//!
//! let me = Identity::new("https://id.example/me/profile/card#me")?;
//! let client = HttpResourceClient::new(Credentials::Bearer("token".into()));
//! let storage = PollStorage::new(Arc::new(client));
//! let poll = storage.create_poll(&me, NewPoll::new("Lunch", "Where to?")).await?;
//! let votes = storage.get_all_votes_for_poll(&me, &poll.id).await;
//! # let _ = votes;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
mod collection;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ids;
pub mod layout;
pub mod locate;
pub mod records;
pub mod registry;
pub mod storage;

pub use config::{ProviderRule, StorageConfig};
pub use discovery::scrape_poll_ids;
pub use error::{PollError, PollResult};
pub use ids::{IdGenerator, UuidGenerator};
pub use layout::PodLayout;
pub use locate::{declared_storage, LocationResolver};
pub use storage::PollStorage;

// Re-export the types callers need alongside the engine.
pub use podpoll_store::{
    Credentials, Diagnostic, Diagnostics, HttpResourceClient, ResourceClient, SideEffect, StoreError,
    Visibility,
};
pub use podpoll_types::{
    Identity, NewPoll, Poll, PollId, Statement, StatementWithVotes, Vote, VoteCount, VoteValue,
};
