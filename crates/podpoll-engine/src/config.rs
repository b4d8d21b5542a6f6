use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PollError, PollResult};

/// Placeholder replaced by the account name in a provider storage template.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Maps identities hosted by a known provider onto that provider's storage.
///
/// The first non-empty path segment of the identity is the account name:
/// `https://id.inrupt.com/alice/profile/card#me` with template
/// `https://storage.inrupt.com/{account}/` yields
/// `https://storage.inrupt.com/alice/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRule {
    pub identity_host: String,
    pub storage_template: String,
}

impl ProviderRule {
    pub fn new(identity_host: impl Into<String>, storage_template: impl Into<String>) -> Self {
        Self {
            identity_host: identity_host.into(),
            storage_template: storage_template.into(),
        }
    }

    pub fn storage_for(&self, account: &str) -> String {
        self.storage_template.replace(ACCOUNT_PLACEHOLDER, account)
    }
}

/// Layout and discovery settings for poll storage.
///
/// Every pod stores poll data under
/// `<root><app_container><polls_container><poll id>/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub app_container: String,
    pub polls_container: String,
    pub poll_resource: String,
    pub statements_resource: String,
    pub votes_resource: String,
    pub participants_resource: String,
    pub poll_index_resource: String,
    pub provider_rules: Vec<ProviderRule>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            app_container: "polis/".into(),
            polls_container: "polls/".into(),
            poll_resource: "poll.json".into(),
            statements_resource: "statements.json".into(),
            votes_resource: "votes.json".into(),
            participants_resource: "participants.json".into(),
            poll_index_resource: "index.json".into(),
            provider_rules: vec![ProviderRule::new(
                "id.inrupt.com",
                "https://storage.inrupt.com/{account}/",
            )],
        }
    }
}

impl StorageConfig {
    pub fn from_toml_str(raw: &str) -> PollResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| PollError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> PollResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> PollResult<()> {
        for (field, value) in [
            ("app_container", &self.app_container),
            ("polls_container", &self.polls_container),
        ] {
            if value.is_empty() || !value.ends_with('/') || value[..value.len() - 1].contains('/') {
                return Err(PollError::Config(format!(
                    "{field} must be a single segment ending in '/', got {value:?}"
                )));
            }
        }
        for (field, value) in [
            ("poll_resource", &self.poll_resource),
            ("statements_resource", &self.statements_resource),
            ("votes_resource", &self.votes_resource),
            ("participants_resource", &self.participants_resource),
            ("poll_index_resource", &self.poll_index_resource),
        ] {
            if value.is_empty() || value.contains('/') {
                return Err(PollError::Config(format!(
                    "{field} must be a plain resource name, got {value:?}"
                )));
            }
        }
        for rule in &self.provider_rules {
            if !rule.storage_template.contains(ACCOUNT_PLACEHOLDER) {
                return Err(PollError::Config(format!(
                    "storage template for {} lacks {ACCOUNT_PLACEHOLDER}",
                    rule.identity_host
                )));
            }
        }
        Ok(())
    }
}
