/// Errors from remote resource operations.
///
/// A missing resource is not an error: reads return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Creation target already exists (HTTP 409 / 412 on create).
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    /// The container a resource would be written into does not exist.
    #[error("parent container missing for {0}")]
    ParentMissing(String),

    /// The caller's credentials do not grant the required mode.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// The pod could not be reached (offline, DNS, connection reset).
    #[error("store unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    /// Any other non-success status.
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    /// The URL cannot address a resource of the requested kind.
    #[error("invalid resource URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    pub fn unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for a create that lost to an existing resource.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
