use crate::error::LineCountError;
use std::collections::HashMap;

/// Source lines of code for a file at a revision, provided by an external metric.
pub trait LineCounter: Send + Sync {
    fn line_count(&self, path: &str, revision: &str) -> Result<u64, LineCountError>;
}

/// Line counts known up front: (path, revision) → lines.
#[derive(Debug, Clone, Default)]
pub struct StaticLineCounts {
    counts: HashMap<(String, String), u64>,
}

impl StaticLineCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, revision: &str, lines: u64) {
        self.counts
            .insert((path.to_string(), revision.to_string()), lines);
    }

    pub fn with(mut self, path: &str, revision: &str, lines: u64) -> Self {
        self.insert(path, revision, lines);
        self
    }
}

impl LineCounter for StaticLineCounts {
    fn line_count(&self, path: &str, revision: &str) -> Result<u64, LineCountError> {
        self.counts
            .get(&(path.to_string(), revision.to_string()))
            .copied()
            .ok_or_else(|| LineCountError::NotFound {
                path: path.to_string(),
                revision: revision.to_string(),
            })
    }
}
