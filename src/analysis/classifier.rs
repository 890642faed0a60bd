use crate::analysis::file_type::{file_type, FileType};
use crate::analysis::line_count::LineCounter;
use crate::error::ContribError;
use crate::models::action::{ActionObservation, ActionType};
use crate::models::commit::{CommitRecord, FileChange};
use regex::Regex;
use std::sync::LazyLock;

static BUG_NUMBER_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(pr:|bug:)").ok());

static POINTY_HAT_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(ph:|pointy hat|p?hat:)").ok());

/// Non-fatal conditions met while classifying a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationWarning {
    /// No previous version known for a modified source file; counted from zero lines.
    MissingPreviousRevision { path: String },
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub observations: Vec<ActionObservation>,
    pub warnings: Vec<ClassificationWarning>,
}

impl Classification {
    fn emit(&mut self, commit: &CommitRecord, action: ActionType, magnitude: u64) {
        self.observations.push(ActionObservation {
            developer: commit.committer.clone(),
            commit: commit.id.clone(),
            action,
            magnitude,
        });
    }

    pub fn count(&self, action: ActionType) -> usize {
        self.observations
            .iter()
            .filter(|o| o.action == action)
            .count()
    }

    pub fn magnitude(&self, action: ActionType) -> u64 {
        self.observations
            .iter()
            .filter(|o| o.action == action)
            .map(|o| o.magnitude)
            .sum()
    }
}

pub fn is_bug_reference(message: &str) -> bool {
    BUG_NUMBER_LABEL
        .as_ref()
        .is_some_and(|re| re.is_match(message))
}

pub fn is_pointy_hat(message: &str) -> bool {
    POINTY_HAT_LABEL
        .as_ref()
        .is_some_and(|re| re.is_match(message))
}

/// Classify one commit into contribution actions.
///
/// Any line count that cannot be retrieved aborts the whole commit; the
/// caller gets no partial observations.
pub fn classify_commit(
    commit: &CommitRecord,
    many_files_threshold: usize,
    lines: &dyn LineCounter,
) -> Result<Classification, ContribError> {
    let mut out = Classification::default();

    if commit.message.is_empty() {
        out.emit(commit, ActionType::CEC, 1);
    } else {
        if is_bug_reference(&commit.message) {
            out.emit(commit, ActionType::CBN, 1);
        }
        if is_pointy_hat(&commit.message) {
            out.emit(commit, ActionType::CPH, 1);
        }
    }

    if commit.files.len() > many_files_threshold {
        out.emit(commit, ActionType::CMF, 1);
    }

    for file in &commit.files {
        if file.is_directory {
            if file.is_added() {
                out.emit(commit, ActionType::CND, 1);
            }
            continue;
        }

        match file_type(&file.path) {
            FileType::Source => {
                let changed = changed_lines(commit, file, lines, &mut out)?;
                out.emit(commit, ActionType::CAL, changed);
            }
            FileType::Binary => out.emit(commit, ActionType::CBF, 1),
            FileType::Document => out.emit(commit, ActionType::CDF, 1),
            FileType::Translation => out.emit(commit, ActionType::CTF, 1),
            FileType::Other => {}
        }
    }

    Ok(out)
}

fn changed_lines(
    commit: &CommitRecord,
    file: &FileChange,
    lines: &dyn LineCounter,
    out: &mut Classification,
) -> Result<u64, ContribError> {
    let current = if file.is_deleted() {
        0
    } else {
        lookup(commit, &file.path, &commit.id, lines)?
    };

    let previous = if file.is_added() {
        out.emit(commit, ActionType::CNS, 1);
        0
    } else {
        match file.previous_revision.as_deref() {
            Some(revision) => lookup(commit, &file.path, revision, lines)?,
            None => {
                log::warn!(
                    "Cannot get previous file version for {} in commit {}",
                    file.path,
                    commit.id
                );
                out.warnings.push(ClassificationWarning::MissingPreviousRevision {
                    path: file.path.clone(),
                });
                0
            }
        }
    };

    Ok(current.abs_diff(previous))
}

fn lookup(
    commit: &CommitRecord,
    path: &str,
    revision: &str,
    lines: &dyn LineCounter,
) -> Result<u64, ContribError> {
    lines.line_count(path, revision).map_err(|e| {
        log::error!(
            "Line count for project {} file {} at revision {} could not be retrieved: {}",
            commit.project,
            path,
            revision,
            e
        );
        ContribError::LookupFailure {
            commit: commit.id.clone(),
            path: path.to_string(),
            revision: revision.to_string(),
            reason: e.to_string(),
        }
    })
}
