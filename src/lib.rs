//! Markdown notes with a YAML-style frontmatter header, kept in a local
//! store and synchronized with a folder of a GitHub repository.

pub mod markdown;
pub mod storage;
pub mod sync;
