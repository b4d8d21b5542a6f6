use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Identity, PollId};

/// Caller-supplied fields of a poll about to be created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPoll {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl NewPoll {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Poll metadata.
///
/// Physically stored only in the creator's pod and immutable after creation,
/// except for the optional pointer to the participant registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub creator: Identity,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants_url: Option<String>,
}

impl Poll {
    /// Materialize a poll from its caller-supplied fields.
    pub fn create(id: PollId, creator: Identity, fields: NewPoll, created: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            creator,
            created,
            participants_url: None,
        }
    }
}
