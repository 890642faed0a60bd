use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub is_directory: bool,
    /// Revision holding the previous version of this file, when the feed knows it.
    #[serde(default)]
    pub previous_revision: Option<String>,
}

impl FileChange {
    pub fn is_added(&self) -> bool {
        self.kind == ChangeKind::Added
    }

    pub fn is_deleted(&self) -> bool {
        self.kind == ChangeKind::Deleted
    }
}

/// One project version as delivered by the commit feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Revision id; also the revision used for current line counts.
    pub id: String,
    pub project: String,
    pub committer: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub files: Vec<FileChange>,
}
