//! Whole-file JSON collections and their versionless read-modify-write.
//!
//! Each collection (statements, votes, participants, poll index) is a single
//! JSON array resource. Every mutation reads the array, edits it in memory and
//! writes the whole array back.
//!
//! Known race: nothing guards the window between read and write. Two
//! concurrent mutations of the same collection by the same identity (two tabs
//! voting at once) can lose one update; the later write wins. If pods expose
//! conditional writes this is where an `If-Match` precondition belongs.

use podpoll_store::ResourceClient;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PollError, PollResult};

pub(crate) const JSON: &str = "application/json";

/// Read a JSON array. `Ok(None)` if the resource does not exist; a blank body
/// is an empty collection.
pub(crate) async fn read<T: DeserializeOwned>(
    client: &dyn ResourceClient,
    url: &str,
) -> PollResult<Option<Vec<T>>> {
    let Some(resource) = client.get(url).await? else {
        return Ok(None);
    };
    if resource.is_blank() {
        return Ok(Some(Vec::new()));
    }
    serde_json::from_str(&resource.body)
        .map(Some)
        .map_err(|e| PollError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Failures of a public read are reported as absence ("no data yet").
///
/// Only for reads that return data to a caller. Read-modify-write must use
/// [`read`] directly so an unreadable collection is never overwritten.
pub(crate) fn absent_on_failure<T>(url: &str, result: PollResult<Option<T>>) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(url, error = %e, "read failed, treating as absent");
            None
        }
    }
}

/// Overwrite a collection with `items`.
pub(crate) async fn write<T: Serialize>(
    client: &dyn ResourceClient,
    url: &str,
    items: &[T],
) -> PollResult<()> {
    let body = serde_json::to_string(items).map_err(|e| PollError::Encode(e.to_string()))?;
    client.put(url, &body, JSON).await?;
    Ok(())
}

/// What a [`modify`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Modified {
    /// The collection did not exist before this call.
    pub created: bool,
    /// A write was issued.
    pub written: bool,
}

/// Versionless read-modify-write.
///
/// `edit` receives the current items (empty if absent) and returns whether
/// it changed them; unchanged collections are not written. A malformed
/// existing collection is an error rather than being overwritten.
pub(crate) async fn modify<T, F>(client: &dyn ResourceClient, url: &str, edit: F) -> PollResult<Modified>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut Vec<T>) -> bool,
{
    let current = read::<T>(client, url).await?;
    let created = current.is_none();
    let mut items = current.unwrap_or_default();
    if !edit(&mut items) {
        return Ok(Modified {
            created,
            written: false,
        });
    }
    write(client, url, &items).await?;
    Ok(Modified {
        created,
        written: true,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use podpoll_store::InMemoryPodServer;
    use podpoll_types::Identity;

    const ROOT: &str = "https://pod.example/";

    fn client() -> (Arc<InMemoryPodServer>, podpoll_store::InMemoryClient) {
        let server = Arc::new(InMemoryPodServer::new());
        let owner = Identity::new("https://pod.example/profile/card#me").unwrap();
        server.add_pod(ROOT, owner.clone());
        let client = server.client_for(owner);
        (server, client)
    }

    #[tokio::test]
    async fn absent_is_none_blank_is_empty() {
        let (_server, client) = client();
        let url = "https://pod.example/a.json";
        assert!(read::<u32>(&client, url).await.unwrap().is_none());
        client.put(url, " ", JSON).await.unwrap();
        assert_eq!(read::<u32>(&client, url).await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn modify_reports_creation_and_skips_noop() {
        let (server, client) = client();
        let url = "https://pod.example/a.json";

        let first = modify::<u32, _>(&client, url, |items| {
            items.push(1);
            true
        })
        .await
        .unwrap();
        assert_eq!(first, Modified { created: true, written: true });

        let second = modify::<u32, _>(&client, url, |_| false).await.unwrap();
        assert_eq!(second, Modified { created: false, written: false });
        assert_eq!(server.resource(url).unwrap().body, "[1]");
    }

    #[tokio::test]
    async fn malformed_collection_is_not_overwritten() {
        let (server, client) = client();
        let url = "https://pod.example/a.json";
        client.put(url, "{not json", JSON).await.unwrap();
        let err = modify::<u32, _>(&client, url, |items| {
            items.push(1);
            true
        })
        .await
        .unwrap_err();
        assert!(matches!(err, PollError::Decode { .. }));
        assert_eq!(server.resource(url).unwrap().body, "{not json");
    }
}
