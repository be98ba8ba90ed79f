pub mod config;
pub mod github;
pub mod merge;
pub mod remote;

mod manager;

pub use config::{
    default_commit_message, FetchReport, GitHubConfig, PushReport, SessionKind, SessionState,
    SessionStatus, SkippedItem, SyncProgress,
};
pub use github::GitHubClient;
pub use manager::{ProgressListener, SyncError, SyncManager};
pub use merge::{merge_remote, MergeSummary};
pub use remote::{PutRequest, PutResponse, RemoteEntry, RemoteError, RemoteFile, RemoteStore};
