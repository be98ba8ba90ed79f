use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::sync::config::GitHubConfig;
use crate::sync::remote::{
    PutRequest, PutResponse, RemoteEntry, RemoteError, RemoteFile, RemoteStore,
};

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("ghnotes/", env!("CARGO_PKG_VERSION"));

/// Client for the GitHub repository contents API
pub struct GitHubClient {
    client: Client,
    base_url: String,
    owner: String,
    repo: String,
    token: Option<String>,
    branch: Option<String>,
}

impl GitHubClient {
    /// Create a client for the repository named in `config`
    pub fn new(config: &GitHubConfig) -> Result<Self, RemoteError> {
        // Normalize URL - ensure no trailing slash
        let base_url = config.api_base_url().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(RemoteError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GITHUB_JSON));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            owner: config.owner.trim().to_string(),
            repo: config.repo.trim().to_string(),
            token: config.token().map(str::to_string),
            branch: config.branch().map(str::to_string),
        })
    }

    /// Contents API URL for a repository path
    fn contents_url(&self, path: &str) -> String {
        let encoded = encode_path(path);
        let root = format!(
            "{}/repos/{}/{}/contents",
            self.base_url,
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo)
        );
        if encoded.is_empty() {
            root
        } else {
            format!("{}/{}", root, encoded)
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn with_ref(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.branch {
            Some(branch) => request.query(&[("ref", branch.as_str())]),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteStore for GitHubClient {
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let url = self.contents_url(path);
        log::debug!("GitHub: listing {}", url);

        let request = self.with_ref(self.authorize(self.client.get(&url)));
        let response = check_status(request.send().await?, path).await?;

        let listing: serde_json::Value = response.json().await?;
        if !listing.is_array() {
            return Err(RemoteError::NotADirectory(path.to_string()));
        }

        serde_json::from_value(listing)
            .map_err(|e| RemoteError::InvalidResponse(format!("directory listing: {}", e)))
    }

    async fn get_file(&self, entry: &RemoteEntry) -> Result<RemoteFile, RemoteError> {
        log::debug!("GitHub: fetching {}", entry.url);

        let request = self.authorize(self.client.get(&entry.url));
        let response = check_status(request.send().await?, &entry.path).await?;

        response
            .json::<RemoteFile>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(format!("{}: {}", entry.name, e)))
    }

    async fn put_file(&self, path: &str, request: &PutRequest) -> Result<PutResponse, RemoteError> {
        let url = self.contents_url(path);
        log::debug!(
            "GitHub: writing {} ({})",
            url,
            if request.sha.is_some() { "update" } else { "create" }
        );

        let builder = self.authorize(self.client.put(&url)).json(request);
        let response = check_status(builder.send().await?, path).await?;

        response
            .json::<PutResponse>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(format!("write response for {}: {}", path, e)))
    }
}

/// Percent-encode each segment of a slash separated path
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

async fn check_status(response: Response, path: &str) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, path, &body))
}

/// Map a non-success status to the error the sync layer reports
fn classify_status(status: StatusCode, path: &str, body: &str) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::AuthFailed,
        // 403 also covers rate limiting and missing scopes; keep GitHub's message for those
        StatusCode::FORBIDDEN => {
            let message = github_message(body, status);
            if is_credential_problem(&message) {
                RemoteError::AuthFailed
            } else {
                RemoteError::Status {
                    status: status.as_u16(),
                    message,
                }
            }
        }
        StatusCode::NOT_FOUND => RemoteError::NotFound(path.to_string()),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            RemoteError::Conflict(github_message(body, status))
        }
        status => RemoteError::Status {
            status: status.as_u16(),
            message: github_message(body, status),
        },
    }
}

fn is_credential_problem(message: &str) -> bool {
    let message = message.to_lowercase();
    ["bad credentials", "requires authentication", "token"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// GitHub error bodies are `{"message": "..."}`; fall back to the raw body or reason phrase
fn github_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
}
