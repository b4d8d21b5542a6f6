//! Fan-out reads across every known participant.
//!
//! One read per identity is issued concurrently and all are joined before
//! returning. An identity whose pod fails to answer contributes nothing; the
//! aggregation itself never fails. Items from one identity keep their
//! insertion order; the order across identities is unspecified.

use std::future::Future;

use futures::future::join_all;
use podpoll_types::{Identity, PollId, Statement, StatementWithVotes, Vote};

use crate::error::PollResult;
use crate::storage::PollStorage;

async fn fan_out<'a, T, F, Fut>(identities: &'a [Identity], poll: &PollId, read: F) -> Vec<T>
where
    F: Fn(&'a Identity) -> Fut,
    Fut: Future<Output = PollResult<Vec<T>>>,
{
    let results = join_all(identities.iter().map(|identity| {
        let pending = read(identity);
        async move { (identity, pending.await) }
    }))
    .await;

    let mut merged = Vec::new();
    for (identity, result) in results {
        match result {
            Ok(items) => merged.extend(items),
            Err(e) => {
                tracing::warn!(poll = %poll, identity = %identity, error = %e, "skipping unreadable participant");
            }
        }
    }
    merged
}

impl PollStorage {
    /// Statements from every identity in `identities`.
    pub async fn get_all_statements(&self, identities: &[Identity], poll: &PollId) -> Vec<Statement> {
        fan_out(identities, poll, |identity| self.get_statements(identity, poll)).await
    }

    /// Votes from every identity in `identities`.
    pub async fn get_all_votes(&self, identities: &[Identity], poll: &PollId) -> Vec<Vote> {
        fan_out(identities, poll, |identity| self.get_votes(identity, poll)).await
    }

    /// Statements from every registered participant of `creator`'s poll.
    pub async fn get_all_statements_for_poll(&self, creator: &Identity, poll: &PollId) -> Vec<Statement> {
        let participants = self.participants_or_creator(creator, poll).await;
        self.get_all_statements(&participants, poll).await
    }

    /// Votes from every registered participant of `creator`'s poll.
    pub async fn get_all_votes_for_poll(&self, creator: &Identity, poll: &PollId) -> Vec<Vote> {
        let participants = self.participants_or_creator(creator, poll).await;
        self.get_all_votes(&participants, poll).await
    }

    /// Aggregated statements joined with their tallies, as seen by `viewer`.
    pub async fn statements_with_votes(
        &self,
        creator: &Identity,
        poll: &PollId,
        viewer: Option<&Identity>,
    ) -> Vec<StatementWithVotes> {
        let participants = self.participants_or_creator(creator, poll).await;
        let (statements, votes) = futures::join!(
            self.get_all_statements(&participants, poll),
            self.get_all_votes(&participants, poll)
        );
        StatementWithVotes::assemble(&statements, &votes, viewer)
    }
}
