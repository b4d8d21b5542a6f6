use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::{Identity, PollId};

/// The closed set of vote values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Agree,
    Disagree,
    Pass,
}

impl VoteValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agree => "agree",
            Self::Disagree => "disagree",
            Self::Pass => "pass",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteValue {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "agree" => Ok(Self::Agree),
            "disagree" => Ok(Self::Disagree),
            "pass" => Ok(Self::Pass),
            _ => Err(TypeError::InvalidVoteValue(s.to_string())),
        }
    }
}

/// A vote on one statement, stored in the voter's own pod.
///
/// A voter holds at most one vote per statement in a poll: the vote
/// collection is keyed by `statement_id`, not by `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub poll_id: PollId,
    pub statement_id: String,
    pub voter: Identity,
    pub value: VoteValue,
    pub created: DateTime<Utc>,
}

/// Derived per-statement tally. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub agree: u32,
    pub disagree: u32,
    pub pass: u32,
}

impl VoteCount {
    /// Count the votes cast on `statement_id`.
    pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>, statement_id: &str) -> Self {
        let mut count = Self::default();
        for vote in votes.into_iter().filter(|v| v.statement_id == statement_id) {
            count.record(vote.value);
        }
        count
    }

    pub fn record(&mut self, value: VoteValue) {
        match value {
            VoteValue::Agree => self.agree += 1,
            VoteValue::Disagree => self.disagree += 1,
            VoteValue::Pass => self.pass += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.agree + self.disagree + self.pass
    }
}
