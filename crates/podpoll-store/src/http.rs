use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, IF_NONE_MATCH, LINK};
use reqwest::{Method, RequestBuilder, Response, StatusCode};

use crate::access::{AccessPolicy, ACL_SUFFIX};
use crate::error::{StoreError, StoreResult};
use crate::resource::{is_container, Resource};
use crate::traits::ResourceClient;

/// Profiles and container listings must come back as Turtle; JSON
/// collections are served as stored.
const READ_ACCEPT: &str = "text/turtle, application/json;q=0.9, */*;q=0.8";
const BASIC_CONTAINER_LINK: &str = "<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"";

/// Function that attaches a caller's credentials to an outgoing request.
pub type AuthenticateFn = Arc<dyn Fn(RequestBuilder) -> RequestBuilder + Send + Sync>;

/// Credentials supplied by the session layer.
///
/// The store never obtains, refreshes or inspects them; it only attaches them
/// to every request.
#[derive(Clone)]
pub enum Credentials {
    Anonymous,
    Bearer(String),
    /// Caller-provided request decoration (e.g. DPoP-bound tokens).
    Custom(AuthenticateFn),
}

impl Credentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Anonymous => request,
            Self::Bearer(token) => request.bearer_auth(token),
            Self::Custom(authenticate) => authenticate(request),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Bearer(_) => write!(f, "Bearer(..)"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// [`ResourceClient`] speaking the pod protocol over HTTP.
#[derive(Clone, Debug)]
pub struct HttpResourceClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl HttpResourceClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(reqwest::Client::new(), credentials)
    }

    /// Use a preconfigured client (timeouts, proxies, TLS roots).
    pub fn with_client(http: reqwest::Client, credentials: Credentials) -> Self {
        Self { http, credentials }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.credentials.apply(self.http.request(method, url))
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> StoreResult<Response> {
        request
            .send()
            .await
            .map_err(|e| StoreError::unavailable(url, e.to_string()))
    }
}

fn status_error(url: &str, status: StatusCode) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Forbidden(url.to_string()),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
            StoreError::AlreadyExists(url.to_string())
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
            StoreError::unavailable(url, status.to_string())
        }
        _ => StoreError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        },
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn get(&self, url: &str) -> StoreResult<Option<Resource>> {
        tracing::debug!(url, "GET");
        let request = self.request(Method::GET, url).header(ACCEPT, READ_ACCEPT);
        let response = self.send(url, request).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(url, status));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::unavailable(url, e.to_string()))?;
        Ok(Some(Resource { body, content_type }))
    }

    async fn put(&self, url: &str, body: &str, content_type: &str) -> StoreResult<()> {
        if is_container(url) {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        tracing::debug!(url, bytes = body.len(), "PUT");
        let request = self
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, content_type)
            .body(body.to_string());
        let response = self.send(url, request).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(url, status))
        }
    }

    async fn create_container(&self, url: &str) -> StoreResult<()> {
        if !is_container(url) {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        tracing::debug!(url, "create container");
        let request = self
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, "text/turtle")
            .header(LINK, BASIC_CONTAINER_LINK)
            .header(IF_NONE_MATCH, "*");
        let response = self.send(url, request).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(url, status))
        }
    }

    async fn set_access(&self, url: &str, policy: &AccessPolicy) -> StoreResult<()> {
        let acl_url = format!("{url}{ACL_SUFFIX}");
        tracing::debug!(url = %acl_url, "PUT access policy");
        let request = self
            .request(Method::PUT, &acl_url)
            .header(CONTENT_TYPE, "text/turtle")
            .body(policy.to_turtle(url));
        let response = self.send(&acl_url, request).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(&acl_url, status))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::body::Bytes;
    use axum::extract::{OriginalUri, State};
    use axum::http::{HeaderMap, Method as AxumMethod, StatusCode as AxumStatus};
    use axum::Router;
    use podpoll_types::Identity;
    use tokio::net::TcpListener;

    use super::*;
    use crate::access::Visibility;

    #[derive(Clone, Default)]
    struct FakePod {
        files: Arc<Mutex<HashMap<String, (String, String)>>>,
        auth_seen: Arc<Mutex<Vec<String>>>,
        accept_seen: Arc<Mutex<Vec<String>>>,
    }

    async fn handle(
        State(pod): State<FakePod>,
        method: AxumMethod,
        OriginalUri(uri): OriginalUri,
        headers: HeaderMap,
        body: Bytes,
    ) -> (AxumStatus, HeaderMap, String) {
        let path = uri.path().to_string();
        if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            pod.auth_seen.lock().unwrap().push(auth.to_string());
        }
        if let Some(accept) = headers.get("accept").and_then(|v| v.to_str().ok()) {
            pod.accept_seen.lock().unwrap().push(accept.to_string());
        }
        let mut out = HeaderMap::new();
        if path.starts_with("/locked/") {
            return (AxumStatus::FORBIDDEN, out, String::new());
        }
        let mut files = pod.files.lock().unwrap();
        match method {
            AxumMethod::GET => match files.get(&path) {
                Some((body, content_type)) => {
                    out.insert("content-type", content_type.parse().unwrap());
                    (AxumStatus::OK, out, body.clone())
                }
                None => (AxumStatus::NOT_FOUND, out, String::new()),
            },
            AxumMethod::PUT => {
                if headers.contains_key("if-none-match") && files.contains_key(&path) {
                    return (AxumStatus::PRECONDITION_FAILED, out, String::new());
                }
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let body = String::from_utf8(body.to_vec()).unwrap();
                files.insert(path, (body, content_type));
                (AxumStatus::CREATED, out, String::new())
            }
            _ => (AxumStatus::METHOD_NOT_ALLOWED, out, String::new()),
        }
    }

    async fn spawn_pod() -> (String, FakePod) {
        let pod = FakePod::default();
        let app = Router::new().fallback(handle).with_state(pod.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), pod)
    }

    #[tokio::test]
    async fn missing_resource_is_none() {
        let (base, _pod) = spawn_pod().await;
        let client = HttpResourceClient::new(Credentials::Anonymous);
        assert!(client.get(&format!("{base}/nothing.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_prefer_turtle() {
        let (base, pod) = spawn_pod().await;
        let client = HttpResourceClient::new(Credentials::Anonymous);
        client.get(&format!("{base}/profile/card")).await.unwrap();
        let seen = pod.accept_seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("text/turtle"));
        assert!(seen[0].contains("application/json"));
    }

    #[tokio::test]
    async fn put_then_get_with_bearer() {
        let (base, pod) = spawn_pod().await;
        let client = HttpResourceClient::new(Credentials::Bearer("secret-token".into()));
        let url = format!("{base}/polis/votes.json");
        client.put(&url, "[]", "application/json").await.unwrap();
        let read = client.get(&url).await.unwrap().unwrap();
        assert_eq!(read.body, "[]");
        assert_eq!(read.content_type, "application/json");

        let seen = pod.auth_seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|h| h == "Bearer secret-token"));
    }

    #[tokio::test]
    async fn custom_credentials_decorate_every_request() {
        let (base, pod) = spawn_pod().await;
        let authenticate: AuthenticateFn =
            Arc::new(|request: RequestBuilder| request.header("authorization", "DPoP abc"));
        let client = HttpResourceClient::new(Credentials::Custom(authenticate));
        client.create_container(&format!("{base}/polis/")).await.unwrap();
        assert_eq!(pod.auth_seen.lock().unwrap().as_slice(), ["DPoP abc"]);
    }

    #[tokio::test]
    async fn second_container_create_conflicts() {
        let (base, _pod) = spawn_pod().await;
        let client = HttpResourceClient::new(Credentials::Anonymous);
        let url = format!("{base}/polis/");
        client.create_container(&url).await.unwrap();
        let err = client.create_container(&url).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn forbidden_maps_to_forbidden() {
        let (base, _pod) = spawn_pod().await;
        let client = HttpResourceClient::new(Credentials::Anonymous);
        let err = client.get(&format!("{base}/locked/a.json")).await.unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn access_policy_goes_to_sidecar() {
        let (base, pod) = spawn_pod().await;
        let client = HttpResourceClient::new(Credentials::Anonymous);
        let url = format!("{base}/polis/poll.json");
        let owner = Identity::new("https://id.example/carol/profile/card#me").unwrap();
        let policy = AccessPolicy::public(owner, Visibility::PublicRead.modes());
        client.set_access(&url, &policy).await.unwrap();

        let files = pod.files.lock().unwrap();
        let (doc, content_type) = files.get("/polis/poll.json.acl").unwrap();
        assert_eq!(content_type, "text/turtle");
        assert!(doc.contains(&format!("acl:accessTo <{url}>")));
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = HttpResourceClient::new(Credentials::Anonymous);
        let err = client.get(&format!("http://{addr}/a.json")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn credentials_debug_hides_token() {
        let shown = format!("{:?}", Credentials::Bearer("secret".into()));
        assert!(!shown.contains("secret"));
    }
}
