/// A resource body as read from a pod.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub body: String,
    pub content_type: String,
}

impl Resource {
    pub fn new(body: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new(body, "application/json")
    }

    /// Whitespace-only bodies are treated as empty collections by callers.
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Returns `true` if `url` addresses a container.
pub fn is_container(url: &str) -> bool {
    url.ends_with('/')
}

/// The container directly enclosing `url`, or `None` for a pod's origin root.
///
/// ```
/// use podpoll_store::parent_container;
/// assert_eq!(parent_container("https://pod.example/a/b.json"), Some("https://pod.example/a/"));
/// assert_eq!(parent_container("https://pod.example/a/"), Some("https://pod.example/"));
/// assert_eq!(parent_container("https://pod.example/"), None);
/// ```
pub fn parent_container(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")? + 3;
    let path_start = scheme_end + url[scheme_end..].find('/')?;
    let trimmed = url.trim_end_matches('/');
    if trimmed.len() <= path_start {
        return None;
    }
    let cut = trimmed.rfind('/')?;
    if cut < path_start {
        return None;
    }
    Some(&url[..=cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_nested_container() {
        assert_eq!(
            parent_container("https://pod.example/alice/polis/polls/"),
            Some("https://pod.example/alice/polis/")
        );
    }

    #[test]
    fn parent_of_resource_in_root() {
        assert_eq!(
            parent_container("https://pod.example/poll.json"),
            Some("https://pod.example/")
        );
    }

    #[test]
    fn origin_without_path_has_no_parent() {
        assert_eq!(parent_container("https://pod.example"), None);
        assert_eq!(parent_container("not a url"), None);
    }

    #[test]
    fn container_detection() {
        assert!(is_container("https://pod.example/polis/"));
        assert!(!is_container("https://pod.example/polis/votes.json"));
    }

    #[test]
    fn blank_bodies() {
        assert!(Resource::json("  \n").is_blank());
        assert!(!Resource::json("[]").is_blank());
    }
}
