use crate::analysis::classifier::{classify_commit, ClassificationWarning};
use crate::analysis::line_count::LineCounter;
use crate::analysis::weights::{compute_weights, weights_due};
use crate::commands::db::ContributionStore;
use crate::commands::settings::MetricSettings;
use crate::error::ContribError;
use crate::models::action::ActionWeight;
use crate::models::commit::CommitRecord;
use crate::models::score::ScoreBreakdown;
use std::sync::{Arc, Mutex};

pub const LINE_COUNT_METRIC: &str = "Wc.loc";

/// Result of feeding one commit to the metric.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Processed {
        observations: usize,
        warnings: Vec<ClassificationWarning>,
        weights_updated: bool,
    },
    AlreadyProcessed,
}

/// Developer contribution metric: classify commits, accumulate actions,
/// keep weights current and score developers.
pub struct ContributionMetric<S: ContributionStore> {
    store: S,
    line_counter: Option<Arc<dyn LineCounter>>,
    update_lock: Mutex<()>,
}

impl<S: ContributionStore> ContributionMetric<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            line_counter: None,
            update_lock: Mutex::new(()),
        }
    }

    pub fn with_line_counter(mut self, counter: Arc<dyn LineCounter>) -> Self {
        self.line_counter = Some(counter);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_processed(&self, commit: &CommitRecord) -> Result<bool, ContribError> {
        self.store.is_commit_processed(&commit.project, &commit.id)
    }

    pub fn processed_commit_count(&self) -> Result<u64, ContribError> {
        self.store.processed_commit_count()
    }

    /// Classify a commit, accumulate its actions and update the weights when due.
    ///
    /// Nothing is stored when classification fails; the caller may retry the
    /// commit in full.
    pub fn process_commit(
        &self,
        commit: &CommitRecord,
        settings: &MetricSettings,
    ) -> Result<ProcessOutcome, ContribError> {
        validate(settings)?;

        let Some(lines) = self.line_counter.as_deref() else {
            log::error!("Could not find the {LINE_COUNT_METRIC} line count metric");
            return Err(ContribError::MissingDependency {
                name: LINE_COUNT_METRIC.to_string(),
            });
        };

        if self.is_processed(commit)? {
            log::debug!("Commit {} of {} already processed", commit.id, commit.project);
            return Ok(ProcessOutcome::AlreadyProcessed);
        }

        let classification = classify_commit(commit, settings.many_files_threshold, lines)?;

        if !self.store.record_commit(commit, &classification.observations)? {
            return Ok(ProcessOutcome::AlreadyProcessed);
        }

        log::debug!(
            "Commit {} by {}: {} actions",
            commit.id,
            commit.committer,
            classification.observations.len()
        );

        let weights_updated = self.update_weights_if_due(settings.weight_update_interval)?;

        Ok(ProcessOutcome::Processed {
            observations: classification.observations.len(),
            warnings: classification.warnings,
            weights_updated,
        })
    }

    fn update_weights_if_due(&self, interval: u64) -> Result<bool, ContribError> {
        let _guard = self.update_lock.lock().map_err(|_| ContribError::LockPoisoned)?;

        let sequence = self.store.commit_sequence()?;
        let last = self.store.last_weight_update()?;
        if !weights_due(sequence, last, interval) {
            return Ok(false);
        }

        self.recompute_locked(sequence)
    }

    /// Recompute weights now, regardless of the update interval.
    pub fn recompute_weights(&self) -> Result<bool, ContribError> {
        let _guard = self.update_lock.lock().map_err(|_| ContribError::LockPoisoned)?;
        let sequence = self.store.commit_sequence()?;
        self.recompute_locked(sequence)
    }

    fn recompute_locked(&self, marker: u64) -> Result<bool, ContribError> {
        let totals = self.store.type_totals()?;
        let weights = compute_weights(&totals, marker, chrono::Utc::now().timestamp());
        if weights.is_empty() {
            return Ok(false);
        }

        self.store.upsert_weights(&weights)?;
        log::info!("Updated {} contribution weights at commit {marker}", weights.len());
        Ok(true)
    }

    pub fn weights(&self) -> Result<Vec<ActionWeight>, ContribError> {
        self.store.weights()
    }

    pub fn developer_score(&self, developer: &str) -> Result<f64, ContribError> {
        let weights = self.store.weights()?;
        let totals = self.store.developer_totals(developer)?;
        Ok(crate::analysis::score::developer_score(&weights, &totals))
    }

    pub fn score_breakdown(&self, developer: &str) -> Result<ScoreBreakdown, ContribError> {
        let weights = self.store.weights()?;
        let totals = self.store.developer_totals(developer)?;
        Ok(crate::analysis::score::breakdown(developer, &weights, &totals))
    }

    pub fn cleanup_project(&self, project: &str) -> Result<usize, ContribError> {
        let removed = self.store.cleanup_project(project)?;
        log::info!("Removed {removed} contribution records of project {project}");
        Ok(removed)
    }

    pub fn remove_all(&self) -> Result<(), ContribError> {
        self.store.remove_all()
    }
}

fn validate(settings: &MetricSettings) -> Result<(), ContribError> {
    if settings.many_files_threshold == 0 {
        return Err(ContribError::InvalidConfiguration {
            key: crate::commands::settings::CONFIG_CMF_THRESHOLD.to_string(),
            value: "0".to_string(),
        });
    }
    if settings.weight_update_interval == 0 {
        return Err(ContribError::InvalidConfiguration {
            key: crate::commands::settings::CONFIG_WEIGHT_UPDATE_INTERVAL.to_string(),
            value: "0".to_string(),
        });
    }
    Ok(())
}
