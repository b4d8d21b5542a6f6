//! Foundation types for podpoll.
//!
//! Every record in a deliberation poll lives in exactly one participant's
//! pod. This crate defines those records and the small derived views a client
//! computes after aggregating them. Every other podpoll crate depends on
//! `podpoll-types`.
//!
//! # Key Types
//!
//! - [`Identity`]: globally resolvable participant identifier (a WebID URL)
//! - [`PollId`]: opaque poll identifier, also used as a path segment
//! - [`Poll`]: poll metadata, stored only in the creator's pod
//! - [`Statement`]: free-text contribution, stored in the author's pod
//! - [`Vote`]: agree/disagree/pass on one statement, stored in the voter's pod
//! - [`VoteCount`] / [`StatementWithVotes`]: derived tallies, never persisted
//!
//! Records serialize with camelCase field names so that data written by other
//! clients of the same pod layout stays readable.

pub mod error;
pub mod identity;
pub mod poll;
pub mod statement;
pub mod vote;

pub use error::TypeError;
pub use identity::{Identity, PollId};
pub use poll::{NewPoll, Poll};
pub use statement::{Statement, StatementWithVotes};
pub use vote::{Vote, VoteCount, VoteValue};
