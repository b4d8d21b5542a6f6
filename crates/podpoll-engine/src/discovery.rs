//! Poll discovery for one identity.
//!
//! Creators append each new poll id to an index resource in their polls
//! container. Pods written before the index existed (or whose index write
//! failed) fall back to scanning the polls container listing for
//! UUID-shaped segments, which only works while ids are UUIDs.

use std::sync::LazyLock;

use podpoll_store::{SideEffect, Visibility};
use podpoll_types::{Identity, PollId};
use regex::Regex;

use crate::collection;
use crate::error::PollResult;
use crate::layout::PodLayout;
use crate::storage::PollStorage;

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})/")
        .expect("valid uuid segment regex")
});

/// Poll ids appearing as container segments in a listing, first occurrence first.
pub fn scrape_poll_ids(listing: &str) -> Vec<PollId> {
    let mut ids: Vec<PollId> = Vec::new();
    for capture in UUID_SEGMENT.captures_iter(listing) {
        let id = PollId::from(&capture[1]);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

impl PollStorage {
    /// Polls created by `identity`.
    pub async fn list_polls(&self, identity: &Identity) -> PollResult<Vec<PollId>> {
        let layout = self.layout(identity).await?;
        if let Some(mut ids) = collection::read::<PollId>(self.client.as_ref(), &layout.poll_index()).await? {
            let mut seen = std::collections::HashSet::new();
            ids.retain(|id| seen.insert(id.clone()));
            return Ok(ids);
        }
        tracing::debug!(%identity, "no poll index, scanning polls container");
        match self.client.get(&layout.polls_container()).await? {
            Some(listing) => Ok(scrape_poll_ids(&listing.body)),
            None => Ok(Vec::new()),
        }
    }

    /// Append `poll` to the creator's index. Best-effort.
    pub(crate) async fn index_poll(&self, layout: &PodLayout<'_>, creator: &Identity, poll: &PollId) {
        let url = layout.poll_index();
        let result = collection::modify(self.client.as_ref(), &url, |ids: &mut Vec<PollId>| {
            if ids.contains(poll) {
                return false;
            }
            ids.push(poll.clone());
            true
        })
        .await;
        match result {
            Ok(outcome) if outcome.created => {
                self.access.set_visibility(&url, creator, Visibility::PublicRead).await;
            }
            Ok(_) => {}
            Err(e) => self.diagnostics.record(SideEffect::PollIndex, &url, e),
        }
    }
}
