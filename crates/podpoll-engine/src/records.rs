//! Per-identity statement and vote collections.

use chrono::Utc;
use podpoll_store::Visibility;
use podpoll_types::{Identity, PollId, Statement, Vote, VoteValue};

use crate::collection;
use crate::error::PollResult;
use crate::storage::PollStorage;

impl PollStorage {
    /// Statements `identity` has contributed to `poll`, in insertion order.
    ///
    /// Empty if the collection does not exist or cannot be read (the failure
    /// is logged). Only a malformed identity is an error.
    pub async fn get_statements(&self, identity: &Identity, poll: &PollId) -> PollResult<Vec<Statement>> {
        let url = self.layout(identity).await?.statements(poll);
        let items = collection::read(self.client.as_ref(), &url).await;
        Ok(collection::absent_on_failure(&url, items).unwrap_or_default())
    }

    /// Votes `identity` has cast in `poll`. Empty as for
    /// [`PollStorage::get_statements`].
    pub async fn get_votes(&self, identity: &Identity, poll: &PollId) -> PollResult<Vec<Vote>> {
        let url = self.layout(identity).await?.votes(poll);
        let items = collection::read(self.client.as_ref(), &url).await;
        Ok(collection::absent_on_failure(&url, items).unwrap_or_default())
    }

    /// Append a statement to `author`'s collection for `poll`.
    ///
    /// The first write makes the collection publicly readable. When `creator`
    /// names someone other than the author, the author is registered in the
    /// creator's participant registry. Both side effects are best-effort.
    pub async fn add_statement(
        &self,
        author: &Identity,
        poll: &PollId,
        text: &str,
        author_name: Option<&str>,
        creator: Option<&Identity>,
    ) -> PollResult<Statement> {
        let statement = Statement {
            id: self.new_id(),
            poll_id: poll.clone(),
            text: text.to_string(),
            author: author.clone(),
            author_name: author_name.map(str::to_string),
            created: Utc::now(),
        };

        let layout = self.prepare_own_poll(author, poll).await?;
        let url = layout.statements(poll);
        let outcome = collection::modify(self.client.as_ref(), &url, |items: &mut Vec<Statement>| {
            items.push(statement.clone());
            true
        })
        .await?;
        tracing::info!(poll = %poll, author = %author, statement = %statement.id, "statement added");

        if outcome.created {
            self.access.set_visibility(&url, author, Visibility::PublicRead).await;
        }
        self.register_contributor(creator, poll, author).await;
        Ok(statement)
    }

    /// Record `voter`'s vote on `statement_id`, replacing any earlier vote by
    /// the same voter on the same statement.
    ///
    /// Side effects as for [`PollStorage::add_statement`].
    pub async fn add_vote(
        &self,
        voter: &Identity,
        poll: &PollId,
        statement_id: &str,
        value: VoteValue,
        creator: Option<&Identity>,
    ) -> PollResult<Vote> {
        let vote = Vote {
            id: self.new_id(),
            poll_id: poll.clone(),
            statement_id: statement_id.to_string(),
            voter: voter.clone(),
            value,
            created: Utc::now(),
        };

        let layout = self.prepare_own_poll(voter, poll).await?;
        let url = layout.votes(poll);
        let outcome = collection::modify(self.client.as_ref(), &url, |items: &mut Vec<Vote>| {
            upsert_vote(items, vote.clone());
            true
        })
        .await?;
        tracing::info!(poll = %poll, voter = %voter, statement = statement_id, value = %value, "vote recorded");

        if outcome.created {
            self.access.set_visibility(&url, voter, Visibility::PublicRead).await;
        }
        self.register_contributor(creator, poll, voter).await;
        Ok(vote)
    }

    async fn register_contributor(&self, creator: Option<&Identity>, poll: &PollId, contributor: &Identity) {
        if let Some(creator) = creator.filter(|c| *c != contributor) {
            self.add_participant(creator, poll, contributor).await;
        }
    }
}

/// Replace any vote on the same statement, then append.
pub(crate) fn upsert_vote(votes: &mut Vec<Vote>, vote: Vote) {
    votes.retain(|existing| existing.statement_id != vote.statement_id);
    votes.push(vote);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vote(statement_id: &str, value: VoteValue) -> Vote {
        Vote {
            id: format!("{statement_id}-{value}"),
            poll_id: PollId::from("p"),
            statement_id: statement_id.into(),
            voter: Identity::new("https://v.example/#me").unwrap(),
            value,
            created: Utc::now(),
        }
    }

    #[test]
    fn upsert_replaces_by_statement_not_vote_id() {
        let mut votes = vec![vote("s1", VoteValue::Agree), vote("s2", VoteValue::Pass)];
        upsert_vote(&mut votes, vote("s1", VoteValue::Disagree));
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].statement_id, "s2");
        assert_eq!(votes[1].statement_id, "s1");
        assert_eq!(votes[1].value, VoteValue::Disagree);
    }

    proptest! {
        #[test]
        fn upsert_keeps_one_vote_per_statement(targets in proptest::collection::vec(0u8..6, 0..40)) {
            let mut votes = Vec::new();
            for (i, target) in targets.iter().enumerate() {
                let value = match i % 3 {
                    0 => VoteValue::Agree,
                    1 => VoteValue::Disagree,
                    _ => VoteValue::Pass,
                };
                upsert_vote(&mut votes, vote(&format!("s{target}"), value));
            }
            let mut seen = std::collections::HashSet::new();
            for v in &votes {
                prop_assert!(seen.insert(v.statement_id.clone()));
            }
            let distinct: std::collections::HashSet<_> = targets.iter().collect();
            prop_assert_eq!(votes.len(), distinct.len());
        }
    }
}
