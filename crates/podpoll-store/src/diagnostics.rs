//! Capture of best-effort side-effect failures.
//!
//! Visibility grants, participant registration and poll indexing accompany a
//! primary write but must never fail it. Their failures are logged with
//! `tracing::warn!` and retained here so callers can surface them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

const DEFAULT_CAPACITY: usize = 256;

/// The secondary operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SideEffect {
    Visibility,
    ParticipantRegistration,
    PollIndex,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visibility => write!(f, "visibility"),
            Self::ParticipantRegistration => write!(f, "participant-registration"),
            Self::PollIndex => write!(f, "poll-index"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub effect: SideEffect,
    pub resource: String,
    pub message: String,
}

/// Shared, bounded log of swallowed failures. Oldest entries are dropped first.
#[derive(Clone)]
pub struct Diagnostics {
    entries: Arc<Mutex<VecDeque<Diagnostic>>>,
    capacity: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)))),
            capacity: capacity.max(1),
        }
    }

    /// Log and retain a failure.
    pub fn record(&self, effect: SideEffect, resource: &str, error: impl fmt::Display) {
        let message = error.to_string();
        tracing::warn!(%effect, resource, error = %message, "best-effort operation failed");
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Diagnostic {
            effect,
            resource: resource.to_string(),
            message,
        });
    }

    /// Copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().cloned().collect()
    }

    /// Remove and return the retained entries.
    pub fn drain(&self) -> Vec<Diagnostic> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("entries", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
