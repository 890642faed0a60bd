pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

pub use analysis::line_count::{LineCounter, StaticLineCounts};
pub use commands::db::{ContributionStore, SqliteStore};
pub use commands::metric::{ContributionMetric, ProcessOutcome};
pub use commands::settings::MetricSettings;
pub use error::{ContribError, LineCountError};
pub use models::action::{ActionCategory, ActionType, ActionWeight, Polarity, WeightKey};
pub use models::commit::{ChangeKind, CommitRecord, FileChange};
pub use models::version::{Version, VersionsList};
