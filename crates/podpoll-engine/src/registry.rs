//! Participant registry kept in the poll creator's pod.
//!
//! The registry only grows. It is advisory: failing to register a contributor
//! never fails the statement or vote write that triggered it.

use std::collections::HashSet;

use podpoll_store::{SideEffect, Visibility};
use podpoll_types::{Identity, PollId};

use crate::collection;
use crate::error::{PollError, PollResult};
use crate::storage::PollStorage;

/// Drop repeated identities, keeping first occurrences in order.
pub(crate) fn dedup(identities: Vec<Identity>) -> Vec<Identity> {
    let mut seen = HashSet::new();
    identities
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

impl PollStorage {
    /// Identities registered as contributors to `poll`, deduplicated, in
    /// registration order. Empty if the registry does not exist or cannot be
    /// read.
    pub async fn get_participants(&self, creator: &Identity, poll: &PollId) -> PollResult<Vec<Identity>> {
        let url = self.layout(creator).await?.participants(poll);
        let items = collection::read(self.client.as_ref(), &url).await;
        Ok(dedup(collection::absent_on_failure(&url, items).unwrap_or_default()))
    }

    /// Registered participants, or just the creator if the registry is
    /// absent, empty or unreadable.
    pub async fn participants_or_creator(&self, creator: &Identity, poll: &PollId) -> Vec<Identity> {
        match self.get_participants(creator, poll).await {
            Ok(participants) if !participants.is_empty() => participants,
            Ok(_) => vec![creator.clone()],
            Err(e) => {
                tracing::warn!(poll = %poll, creator = %creator, error = %e, "cannot locate participant registry");
                vec![creator.clone()]
            }
        }
    }

    /// Register `identity` in `creator`'s registry for `poll`.
    ///
    /// No-op if already present. Failures are recorded in
    /// [`PollStorage::diagnostics`]. Returns `true` if the registry was updated.
    pub async fn add_participant(&self, creator: &Identity, poll: &PollId, identity: &Identity) -> bool {
        match self.try_add_participant(creator, poll, identity).await {
            Ok(added) => added,
            Err((url, e)) => {
                self.diagnostics.record(SideEffect::ParticipantRegistration, &url, e);
                false
            }
        }
    }

    async fn try_add_participant(
        &self,
        creator: &Identity,
        poll: &PollId,
        identity: &Identity,
    ) -> Result<bool, (String, PollError)> {
        let layout = self
            .layout(creator)
            .await
            .map_err(|e| (creator.to_string(), e))?;
        let url = layout.participants(poll);
        let outcome = collection::modify(self.client.as_ref(), &url, |items: &mut Vec<Identity>| {
            if items.contains(identity) {
                return false;
            }
            items.push(identity.clone());
            true
        })
        .await
        .map_err(|e| (url.clone(), e))?;

        if outcome.written {
            tracing::info!(poll = %poll, participant = %identity, "participant registered");
        }
        if outcome.created {
            self.access
                .set_visibility(&url, creator, Visibility::PublicReadWrite)
                .await;
        }
        Ok(outcome.written)
    }
}
