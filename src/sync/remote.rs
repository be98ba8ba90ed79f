use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Authentication failed")]
    AuthFailed,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Error {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Path is not a directory: {0}")]
    NotADirectory(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Entry kinds reported by a directory listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One item of a remote directory listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Revision marker of the file content
    pub sha: String,
    /// Contents API URL of this entry
    pub url: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl RemoteEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// File content as returned by the contents API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteFile {
    pub sha: String,
    /// Base64 content; GitHub wraps it with newlines
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl RemoteFile {
    /// Decode the transport encoding. Invalid UTF-8 is replaced rather than rejected.
    ///
    /// Files too large for inline content come back with encoding `none` and
    /// an empty body; those are rejected instead of read as empty notes.
    pub fn decode_text(&self) -> Result<String, RemoteError> {
        match self.encoding.as_deref() {
            None | Some("base64") => decode_content(&self.content),
            Some(other) => Err(RemoteError::InvalidResponse(format!(
                "unsupported content encoding '{}'",
                other
            ))),
        }
    }
}

/// Body of a create-or-update write
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PutRequest {
    pub message: String,
    /// Base64 document content
    pub content: String,
    /// Present when updating an existing file; absent means create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl PutRequest {
    pub fn new(message: &str, text: &str, sha: Option<String>, branch: Option<String>) -> Self {
        Self {
            message: message.to_string(),
            content: encode_content(text),
            sha,
            branch,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PutContent {
    pub sha: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Response of a write; carries the new revision marker
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PutResponse {
    pub content: PutContent,
}

pub fn encode_content(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

pub fn decode_content(encoded: &str) -> Result<String, RemoteError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| RemoteError::InvalidResponse(format!("bad base64 content: {}", e)))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// A remote directory of Markdown files
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List the entries of a folder (empty path is the repository root)
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Fetch the content of a listed file
    async fn get_file(&self, entry: &RemoteEntry) -> Result<RemoteFile, RemoteError>;

    /// Create or update the file at `path`
    async fn put_file(&self, path: &str, request: &PutRequest) -> Result<PutResponse, RemoteError>;
}
