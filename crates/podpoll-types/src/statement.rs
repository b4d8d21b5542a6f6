use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Identity, PollId};
use crate::vote::{Vote, VoteCount, VoteValue};

/// A free-text contribution to a poll, stored in the author's own pod.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub id: String,
    pub poll_id: PollId,
    pub text: String,
    pub author: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub created: DateTime<Utc>,
}

/// A statement joined with its tally and, optionally, the viewer's own vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementWithVotes {
    #[serde(flatten)]
    pub statement: Statement,
    pub votes: VoteCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<VoteValue>,
}

impl StatementWithVotes {
    /// Join aggregated statements with aggregated votes.
    ///
    /// Statement order is preserved. Votes for unknown statements are
    /// ignored. `viewer` selects whose vote populates `user_vote`.
    pub fn assemble(
        statements: &[Statement],
        votes: &[Vote],
        viewer: Option<&Identity>,
    ) -> Vec<StatementWithVotes> {
        statements
            .iter()
            .map(|statement| {
                let user_vote = viewer.and_then(|who| {
                    votes
                        .iter()
                        .filter(|v| v.statement_id == statement.id && &v.voter == who)
                        .max_by_key(|v| v.created)
                        .map(|v| v.value)
                });
                StatementWithVotes {
                    votes: VoteCount::tally(votes, &statement.id),
                    statement: statement.clone(),
                    user_vote,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn statement(id: &str, author: &str) -> Statement {
        Statement {
            id: id.into(),
            poll_id: PollId::from("p"),
            text: format!("text of {id}"),
            author: ident(author),
            author_name: None,
            created: Utc::now(),
        }
    }

    fn vote(statement_id: &str, voter: &str, value: VoteValue) -> Vote {
        Vote {
            id: format!("v-{statement_id}-{voter}"),
            poll_id: PollId::from("p"),
            statement_id: statement_id.into(),
            voter: ident(voter),
            value,
            created: Utc::now(),
        }
    }

    #[test]
    fn assemble_tallies_and_picks_viewer_vote() {
        let statements = vec![statement("s1", "https://a/#me"), statement("s2", "https://b/#me")];
        let votes = vec![
            vote("s1", "https://a/#me", VoteValue::Agree),
            vote("s1", "https://b/#me", VoteValue::Disagree),
            vote("s2", "https://b/#me", VoteValue::Pass),
            vote("unknown", "https://b/#me", VoteValue::Agree),
        ];
        let viewer = ident("https://b/#me");
        let view = StatementWithVotes::assemble(&statements, &votes, Some(&viewer));

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].statement.id, "s1");
        assert_eq!(view[0].votes, VoteCount { agree: 1, disagree: 1, pass: 0 });
        assert_eq!(view[0].user_vote, Some(VoteValue::Disagree));
        assert_eq!(view[1].votes, VoteCount { agree: 0, disagree: 0, pass: 1 });
        assert_eq!(view[1].user_vote, Some(VoteValue::Pass));
    }

    #[test]
    fn assemble_without_viewer() {
        let statements = vec![statement("s1", "https://a/#me")];
        let view = StatementWithVotes::assemble(&statements, &[], None);
        assert_eq!(view[0].votes, VoteCount::default());
        assert!(view[0].user_vote.is_none());
    }

    #[test]
    fn author_name_is_optional_on_the_wire() {
        let raw = r#"{"id":"s1","pollId":"p","text":"hi","author":"https://a/#me","created":"2024-01-01T00:00:00.000Z"}"#;
        let s: Statement = serde_json::from_str(raw).unwrap();
        assert!(s.author_name.is_none());
        let out = serde_json::to_value(&s).unwrap();
        assert!(out.get("authorName").is_none());
        assert_eq!(out["pollId"], "p");
    }
}
