//! GitHub REST API client for pull-request lookups

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use tarmac_core::error::GitError;

use crate::repository::Result;
use crate::types::PullRequest;

const USER_AGENT: &str = concat!("tarmac/", env!("CARGO_PKG_VERSION"));

/// Read-only GitHub client scoped to one repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    owner: String,
    name: String,
    token: Option<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    title: String,
    html_url: String,
    user: Option<UserResponse>,
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

impl GitHubClient {
    /// Create a client for `owner/name` against the given API base URL;
    /// every request is abandoned after `timeout`
    pub fn new(api_url: &str, repository: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let api_url = Url::parse(api_url).map_err(|e| GitError::GitHubApi {
            status: None,
            message: format!("invalid API URL '{}': {}", api_url, e),
        })?;
        let (owner, name) = repository
            .split_once('/')
            .ok_or_else(|| GitError::UnsupportedRemote(repository.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GitError::GitHubApi {
                status: None,
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_url,
            owner: owner.to_string(),
            name: name.to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout,
        })
    }

    /// Repository slug this client targets
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    fn pull_url(&self, number: u64) -> Result<Url> {
        let number = number.to_string();
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitError::GitHubApi {
                status: None,
                message: format!("API URL '{}' cannot be a base", self.api_url),
            })?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.name.as_str(), "pulls", number.as_str()]);
        Ok(url)
    }

    /// Fetch a pull request; `None` when it does not exist
    #[instrument(skip(self), fields(repository = %self.repository()))]
    pub async fn pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        let url = self.pull_url(number)?;
        let mut request = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(number, "pull request not found");
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitError::GitHubApi {
                status: Some(status.as_u16()),
                message,
            });
        }

        let pull: PullResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.request_error(e)
            } else {
                GitError::GitHubApi {
                    status: Some(status.as_u16()),
                    message: format!("unexpected response: {}", e),
                }
            }
        })?;
        debug!(number, title = %pull.title, "fetched pull request");

        Ok(Some(PullRequest {
            number: pull.number,
            title: pull.title,
            author: pull.user.map(|u| u.login).unwrap_or_default(),
            url: pull.html_url,
        }))
    }

    fn request_error(&self, e: reqwest::Error) -> GitError {
        if e.is_timeout() {
            GitError::GitHubTimeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            GitError::GitHubApi {
                status: None,
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(30);

    /// Accepts one connection, reads the request head and replies with `response`
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            while !String::from_utf8_lossy(&buf).contains("\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_pull_url() {
        let client = GitHubClient::new("https://api.github.com", "acme/ios-app", None, TIMEOUT).unwrap();
        assert_eq!(
            client.pull_url(42).unwrap().as_str(),
            "https://api.github.com/repos/acme/ios-app/pulls/42"
        );
    }

    #[test]
    fn test_pull_url_with_enterprise_prefix() {
        let client = GitHubClient::new(
            "https://github.example.com/api/v3/",
            "acme/ios-app",
            Some(String::new()),
            TIMEOUT,
        )
        .unwrap();
        assert_eq!(
            client.pull_url(7).unwrap().as_str(),
            "https://github.example.com/api/v3/repos/acme/ios-app/pulls/7"
        );
        assert!(client.token.is_none());
    }

    #[test]
    fn test_rejects_bad_slug() {
        assert!(GitHubClient::new("https://api.github.com", "acme", None, TIMEOUT).is_err());
    }

    #[tokio::test]
    async fn test_fetches_pull_request() {
        let body = r#"{"number":42,"title":"Fix login","html_url":"https://github.com/acme/ios-app/pull/42","user":{"login":"octo"}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (api_url, server) = serve_once(response).await;
        let client = GitHubClient::new(&api_url, "acme/ios-app", Some("secret".to_string()), TIMEOUT).unwrap();

        let pull = client.pull_request(42).await.unwrap().unwrap();
        assert_eq!(pull.title, "Fix login");
        assert_eq!(pull.author, "octo");

        let head = server.await.unwrap();
        assert!(head.starts_with("GET /repos/acme/ios-app/pulls/42 HTTP/1.1"));
        assert!(head.to_ascii_lowercase().contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_missing_pull_request_is_none() {
        let not_found = "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
        let (api_url, _server) = serve_once(not_found.to_string()).await;
        let client = GitHubClient::new(&api_url, "acme/ios-app", None, TIMEOUT).unwrap();
        assert!(client.pull_request(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stalled_api_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Holds the connection open without ever answering
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(socket);
        });

        let client = GitHubClient::new(
            &format!("http://{}", addr),
            "acme/ios-app",
            None,
            Duration::from_millis(200),
        )
        .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), client.pull_request(1))
            .await
            .expect("lookup should give up on its own");
        assert!(matches!(result, Err(GitError::GitHubTimeout { .. })));
    }
}
