//! HTTP implementation of [`PostsApi`].
//!
//! Talks JSON to the service's REST endpoints, optionally through the local
//! Tor SOCKS proxy.

use super::{ApiError, PostsApi, WRITEAS_API_URL};
use crate::protocol::{
    AuthUser, ClaimPostResult, Collection, Envelope, LoginParams, OwnedPostParams, Post,
    PostParams,
};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Request timeout, applied to every call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// How to reach the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://write.as/api`.
    pub base_url: String,
    /// Route through the Tor SOCKS proxy on this local port.
    pub tor_port: Option<u16>,
    /// Access token for authenticated calls.
    pub token: Option<String>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: WRITEAS_API_URL.to_string(),
            tor_port: None,
            token: None,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Client for the Write.as / WriteFreely API.
pub struct WriteasClient {
    base_url: String,
    token: Option<String>,
    user_agent: String,
    client: Client,
}

impl WriteasClient {
    /// Create a new client from the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder().timeout(HTTP_TIMEOUT);
        if let Some(port) = config.tor_port {
            // socks5h so the onion name is resolved by Tor, not locally
            builder = builder.proxy(Proxy::all(format!("socks5h://127.0.0.1:{}", port))?);
        }
        let client = builder.build()?;

        Ok(Self::with_http_client(config, client))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_http_client(config: ClientConfig, client: Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.filter(|t| !t.is_empty()),
            user_agent: config.user_agent,
            client,
        }
    }

    /// Endpoint URL under the API root. Each segment is percent-encoded, so
    /// IDs and aliases can't change the request target.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the headers every request carries.
    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/json");
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Token {}", token)),
            None => request,
        }
    }

    /// Send a request and decode the response envelope.
    ///
    /// The HTTP status always wins over the `code` in the body. Bodies that
    /// are empty (204) or not JSON still yield an envelope so the status can
    /// be mapped.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>, ApiError> {
        let response = self.prepare(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!("API responded {} ({} bytes)", status, bytes.len());

        if bytes.is_empty() {
            return Ok(Envelope {
                code: status.as_u16(),
                error_msg: None,
                data: None,
            });
        }

        match serde_json::from_slice::<Envelope<T>>(&bytes) {
            Ok(mut env) => {
                env.code = status.as_u16();
                Ok(env)
            }
            Err(e) if status.is_success() => Err(ApiError::Decode(e.to_string())),
            Err(_) => Ok(Envelope {
                code: status.as_u16(),
                error_msg: Some(String::from_utf8_lossy(&bytes).trim().to_string()),
                data: None,
            }),
        }
    }
}

/// Extract the payload of a successful envelope, or map its status.
fn into_data<T>(env: Envelope<T>) -> Result<T, ApiError> {
    if (200..300).contains(&env.code) {
        env.data
            .ok_or_else(|| ApiError::Decode("response carried no data".to_string()))
    } else {
        Err(ApiError::from_status(env.code, env.message()))
    }
}

/// Check a body-less success, or map its status.
fn into_unit<T>(env: Envelope<T>) -> Result<(), ApiError> {
    if (200..300).contains(&env.code) {
        Ok(())
    } else {
        Err(ApiError::from_status(env.code, env.message()))
    }
}

#[async_trait]
impl PostsApi for WriteasClient {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn create_post(&self, params: &PostParams) -> Result<Post, ApiError> {
        let url = match params.collection.as_deref() {
            Some(alias) if !alias.is_empty() => self.url(&["collections", alias, "posts"])?,
            _ => self.url(&["posts"])?,
        };
        debug!("Creating post at {}", url.path());
        let env = self.send(self.client.post(url).json(params)).await?;
        into_data(env)
    }

    async fn get_post(&self, id: &str) -> Result<Post, ApiError> {
        let env = self.send(self.client.get(self.url(&["posts", id])?)).await?;
        into_data(env)
    }

    async fn update_post(&self, id: &str, token: &str, params: &PostParams) -> Result<Post, ApiError> {
        let mut params = params.clone();
        params.token = token.to_string();
        let env = self
            .send(self.client.put(self.url(&["posts", id])?).json(&params))
            .await?;
        into_data(env)
    }

    async fn delete_post(&self, id: &str, token: &str) -> Result<(), ApiError> {
        let mut request = self.client.delete(self.url(&["posts", id])?);
        if !token.is_empty() {
            request = request.query(&[("token", token)]);
        }
        let env: Envelope<serde_json::Value> = self.send(request).await?;
        into_unit(env)
    }

    async fn log_in(&self, username: &str, password: &str) -> Result<AuthUser, ApiError> {
        let params = LoginParams {
            alias: username,
            pass: password,
        };
        let env: Envelope<AuthUser> = self
            .send(self.client.post(self.url(&["auth", "login"])?).json(&params))
            .await?;
        if env.code != 200 {
            return Err(ApiError::from_login_status(env.code, env.message()));
        }
        into_data(env)
    }

    async fn log_out(&self) -> Result<(), ApiError> {
        let env: Envelope<serde_json::Value> =
            self.send(self.client.delete(self.url(&["auth", "me"])?)).await?;
        match env.code {
            404 => Err(ApiError::InvalidToken),
            _ => into_unit(env),
        }
    }

    async fn get_user_posts(&self) -> Result<Vec<Post>, ApiError> {
        let env = self.send(self.client.get(self.url(&["me", "posts"])?)).await?;
        into_data(env)
    }

    async fn get_user_collections(&self) -> Result<Vec<Collection>, ApiError> {
        let env = self.send(self.client.get(self.url(&["me", "collections"])?)).await?;
        into_data(env)
    }

    async fn claim_posts(&self, posts: &[OwnedPostParams]) -> Result<Vec<ClaimPostResult>, ApiError> {
        let env = self
            .send(self.client.post(self.url(&["posts", "claim"])?).json(posts))
            .await?;
        into_data(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve a single canned HTTP response on a loopback port.
    ///
    /// Returns the base URL and a receiver yielding the raw request text.
    async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            let _ = tx.send(request);
        });

        (format!("http://{}", addr), rx)
    }

    /// Read the request head plus any Content-Length body.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn client(base_url: String, token: Option<&str>) -> WriteasClient {
        let http = Client::builder().no_proxy().build().unwrap();
        WriteasClient::with_http_client(
            ClientConfig {
                base_url,
                token: token.map(str::to_string),
                user_agent: "writeas-cli test".to_string(),
                ..Default::default()
            },
            http,
        )
    }

    #[tokio::test]
    async fn test_get_post_not_found() {
        let (url, _rx) = serve_once("404 Not Found", r#"{"code":404,"error_msg":"Post not found."}"#).await;
        let err = client(url, None).get_post("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_get_post_transport_failure_is_distinct() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}", addr), None)
            .get_post("abc")
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_post_success() {
        let body = r#"{"code":200,"data":{"id":"abc","title":"Hi","body":"Hello there","appearance":"norm"}}"#;
        let (url, rx) = serve_once("200 OK", body).await;
        let post = client(url, None).get_post("abc").await.unwrap();
        assert_eq!(post.id, "abc");
        assert_eq!(post.title, "Hi");
        assert_eq!(post.content, "Hello there");

        let request = rx.await.unwrap();
        assert!(request.starts_with("GET /posts/abc HTTP/1.1"));
        assert!(request.to_lowercase().contains("user-agent: writeas-cli test"));
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_create_post_in_collection_sends_token() {
        let body = r#"{"code":201,"data":{"id":"p1","slug":"hello","collection":{"alias":"blog","url":"https://write.as/blog/"}}}"#;
        let (url, rx) = serve_once("201 Created", body).await;
        let params = PostParams {
            content: "hello".to_string(),
            font: "norm".to_string(),
            collection: Some("blog".to_string()),
            ..Default::default()
        };
        let post = client(url, Some("secret")).create_post(&params).await.unwrap();
        assert_eq!(post.slug, "hello");
        assert_eq!(post.collection.unwrap().alias, "blog");

        let request = rx.await.unwrap();
        assert!(request.starts_with("POST /collections/blog/posts HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: token secret"));
        assert!(request.contains(r#""body":"hello""#));
    }

    #[tokio::test]
    async fn test_ids_are_escaped_in_the_path() {
        let (url, rx) = serve_once("404 Not Found", r#"{"code":404}"#).await;
        let err = client(format!("{}/api/", url), None)
            .get_post("a/b?c#d")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let request = rx.await.unwrap();
        assert!(request.starts_with("GET /api/posts/a%2Fb%3Fc%23d HTTP/1.1"));
    }

    #[test]
    fn test_bad_base_url() {
        let err = client("not a url".to_string(), None).url(&["posts"]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_delete_post_sends_token_query() {
        let (url, rx) = serve_once("204 No Content", "").await;
        client(url, None).delete_post("abc", "tok").await.unwrap();
        let request = rx.await.unwrap();
        assert!(request.starts_with("DELETE /posts/abc?token=tok HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_update_post_rate_limited() {
        let (url, rx) = serve_once("429 Too Many Requests", r#"{"code":429,"error_msg":"Slow down."}"#).await;
        let params = PostParams {
            content: "new".to_string(),
            ..Default::default()
        };
        let err = client(url, None).update_post("abc", "tok", &params).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
        let request = rx.await.unwrap();
        assert!(request.starts_with("PUT /posts/abc HTTP/1.1"));
        assert!(request.contains(r#""token":"tok""#));
    }

    #[tokio::test]
    async fn test_log_in_incorrect_password() {
        let (url, _rx) = serve_once("401 Unauthorized", r#"{"code":401,"error_msg":"Incorrect password."}"#).await;
        let err = client(url, None).log_in("matt", "nope").await.unwrap_err();
        assert!(matches!(err, ApiError::IncorrectPassword));
    }

    #[tokio::test]
    async fn test_log_in_unknown_user() {
        let (url, _rx) = serve_once("404 Not Found", r#"{"code":404,"error_msg":"User not found."}"#).await;
        let err = client(url, None).log_in("ghost", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::UserNotFound));
    }

    #[tokio::test]
    async fn test_log_in_success() {
        let body = r#"{"code":200,"data":{"access_token":"t0k3n","user":{"username":"matt","email":""}}}"#;
        let (url, rx) = serve_once("200 OK", body).await;
        let user = client(url, None).log_in("matt", "pw").await.unwrap();
        assert_eq!(user.access_token, "t0k3n");
        assert_eq!(user.username(), "matt");
        let request = rx.await.unwrap();
        assert!(request.contains(r#""alias":"matt""#));
        assert!(request.contains(r#""pass":"pw""#));
    }

    #[tokio::test]
    async fn test_non_json_error_body_keeps_status() {
        let (url, _rx) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;
        let err = client(url, None).get_user_posts().await.unwrap_err();
        assert!(matches!(err, ApiError::Unexpected { status: 502, .. }));
    }
}
