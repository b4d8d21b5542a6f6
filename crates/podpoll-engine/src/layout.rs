use podpoll_types::PollId;

use crate::config::StorageConfig;

/// URL scheme for poll data inside one pod.
///
/// ```text
/// <root>polis/                         application container
/// <root>polis/polls/                   polls container
/// <root>polis/polls/index.json         poll index (creator pods)
/// <root>polis/polls/<id>/              poll container
/// <root>polis/polls/<id>/poll.json     poll metadata (creator pod)
/// <root>polis/polls/<id>/participants.json
/// <root>polis/polls/<id>/statements.json
/// <root>polis/polls/<id>/votes.json
/// ```
#[derive(Clone, Debug)]
pub struct PodLayout<'c> {
    root: String,
    config: &'c StorageConfig,
}

impl<'c> PodLayout<'c> {
    /// `root` is normalised to end with `/`.
    pub fn new(root: impl Into<String>, config: &'c StorageConfig) -> Self {
        let mut root = root.into();
        if !root.ends_with('/') {
            root.push('/');
        }
        Self { root, config }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn app_container(&self) -> String {
        format!("{}{}", self.root, self.config.app_container)
    }

    pub fn polls_container(&self) -> String {
        format!("{}{}", self.app_container(), self.config.polls_container)
    }

    pub fn poll_index(&self) -> String {
        format!("{}{}", self.polls_container(), self.config.poll_index_resource)
    }

    pub fn poll_container(&self, poll: &PollId) -> String {
        format!("{}{}/", self.polls_container(), poll)
    }

    pub fn poll(&self, poll: &PollId) -> String {
        format!("{}{}", self.poll_container(poll), self.config.poll_resource)
    }

    pub fn statements(&self, poll: &PollId) -> String {
        format!("{}{}", self.poll_container(poll), self.config.statements_resource)
    }

    pub fn votes(&self, poll: &PollId) -> String {
        format!("{}{}", self.poll_container(poll), self.config.votes_resource)
    }

    pub fn participants(&self, poll: &PollId) -> String {
        format!("{}{}", self.poll_container(poll), self.config.participants_resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let config = StorageConfig::default();
        let layout = PodLayout::new("https://storage.example/alice", &config);
        let poll = PollId::from("p1");
        assert_eq!(layout.root(), "https://storage.example/alice/");
        assert_eq!(layout.polls_container(), "https://storage.example/alice/polis/polls/");
        assert_eq!(layout.poll_index(), "https://storage.example/alice/polis/polls/index.json");
        assert_eq!(layout.poll_container(&poll), "https://storage.example/alice/polis/polls/p1/");
        assert_eq!(layout.poll(&poll), "https://storage.example/alice/polis/polls/p1/poll.json");
        assert_eq!(
            layout.statements(&poll),
            "https://storage.example/alice/polis/polls/p1/statements.json"
        );
        assert_eq!(layout.votes(&poll), "https://storage.example/alice/polis/polls/p1/votes.json");
        assert_eq!(
            layout.participants(&poll),
            "https://storage.example/alice/polis/polls/p1/participants.json"
        );
    }

    #[test]
    fn custom_names() {
        let config = StorageConfig {
            app_container: "deliberation/".into(),
            votes_resource: "ballots.json".into(),
            ..Default::default()
        };
        let layout = PodLayout::new("https://pod.example/", &config);
        assert_eq!(
            layout.votes(&PollId::from("x")),
            "https://pod.example/deliberation/polls/x/ballots.json"
        );
    }
}
