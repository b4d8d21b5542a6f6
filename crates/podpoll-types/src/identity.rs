use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A participant's globally resolvable identity (a WebID).
///
/// The string is used verbatim as an authorship marker on records and as the
/// key for locating the participant's storage root. Well-formedness as a URL
/// is checked where the identity is resolved, not here: a malformed identity
/// can still be carried as an author field read back from someone's pod.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap an identity string. Rejects empty input.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TypeError::EmptyIdentity);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity document URL: the identity without its fragment.
    ///
    /// `https://alice.example/profile/card#me` → `https://alice.example/profile/card`
    pub fn document_url(&self) -> &str {
        match self.0.split_once('#') {
            Some((doc, _)) => doc,
            None => &self.0,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque poll identifier.
///
/// Generated externally (randomly distributed, unique) and used verbatim as a
/// container path segment in every participant's pod.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(String);

impl PollId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Checked constructor for ids from untrusted input.
    ///
    /// Rejects anything that would not stay a single segment below the
    /// polls container: empty, `.`, `..`, or containing `/`, `?` or `#`.
    pub fn parse(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        let escapes = value.is_empty()
            || value == "."
            || value == ".."
            || value.contains(['/', '?', '#']);
        if escapes {
            return Err(TypeError::InvalidPollId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PollId({})", self.0)
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PollId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for PollId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PollId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
