use crate::analysis::score::DeveloperTotals;
use crate::analysis::weights::TypeTotals;
use crate::error::ContribError;
use crate::models::action::{ActionObservation, ActionType, ActionWeight, WeightKey};
use crate::models::commit::CommitRecord;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DB_SCHEMA_VERSION: i64 = 3;

const PROCESSED_COMMITS_COUNTER: &str = "processed_commits";

/// Accumulator and weight storage consumed by the contribution metric.
pub trait ContributionStore: Send + Sync {
    fn is_commit_processed(&self, project: &str, commit: &str) -> Result<bool, ContribError>;

    /// Record a commit and add its observations to the accumulators in one
    /// transaction. Returns `false` without touching anything when the commit
    /// was already recorded.
    fn record_commit(
        &self,
        commit: &CommitRecord,
        observations: &[ActionObservation],
    ) -> Result<bool, ContribError>;

    fn processed_commit_count(&self) -> Result<u64, ContribError>;

    /// Number of commits recorded since the store was created or last
    /// cleared by `remove_all`. Never decreases on `cleanup_project`.
    fn commit_sequence(&self) -> Result<u64, ContribError>;

    fn type_totals(&self) -> Result<TypeTotals, ContribError>;

    fn developer_totals(&self, developer: &str) -> Result<DeveloperTotals, ContribError>;

    fn weights(&self) -> Result<Vec<ActionWeight>, ContribError>;

    fn weight(&self, key: WeightKey) -> Result<Option<ActionWeight>, ContribError>;

    /// Marker of the most recent weight recomputation, if any.
    fn last_weight_update(&self) -> Result<Option<u64>, ContribError>;

    fn upsert_weights(&self, weights: &[ActionWeight]) -> Result<(), ContribError>;

    /// Delete accumulated actions and ledger rows of one project.
    fn cleanup_project(&self, project: &str) -> Result<usize, ContribError>;

    /// Delete all actions, weights and ledger rows.
    fn remove_all(&self) -> Result<(), ContribError>;
}

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 3 {
        apply_migration_3(conn)?;
        version = 3;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("State database schema version {version} is newer than {DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS processed_commits (
            project TEXT NOT NULL,
            commit_id TEXT NOT NULL,
            developer TEXT NOT NULL,
            processed_at INTEGER NOT NULL,
            PRIMARY KEY (project, commit_id)
        );

        CREATE TABLE IF NOT EXISTS contrib_actions (
            project TEXT NOT NULL,
            commit_id TEXT NOT NULL,
            developer TEXT NOT NULL,
            action_type TEXT NOT NULL,
            total INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (project, commit_id, developer, action_type)
        );

        CREATE TABLE IF NOT EXISTS contrib_weights (
            weight_key TEXT PRIMARY KEY,
            weight REAL NOT NULL DEFAULT 0,
            last_update_marker INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL DEFAULT 0
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_contrib_actions_developer ON contrib_actions(developer, action_type);
        CREATE INDEX IF NOT EXISTS idx_contrib_actions_type ON contrib_actions(action_type);
        ",
    )
}

fn apply_migration_3(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS contrib_counters (
            name TEXT PRIMARY KEY,
            value INTEGER NOT NULL DEFAULT 0
        );

        INSERT OR IGNORE INTO contrib_counters (name, value)
        SELECT 'processed_commits', COUNT(*) FROM processed_commits;
        ",
    )
}

pub fn get_db_connection(workspace_path: &str) -> Result<Connection, ContribError> {
    let dir = Path::new(workspace_path).join(".devcontrib");
    std::fs::create_dir_all(&dir)
        .map_err(|e| ContribError::Settings(format!("Failed to create .devcontrib directory: {e}")))?;
    let conn = Connection::open(dir.join("state.db"))?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// SQLite-backed store. The connection is serialized behind a mutex so the
/// store can be shared between worker threads.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(workspace_path: &str) -> Result<Self, ContribError> {
        Ok(Self::from_connection(get_db_connection(workspace_path)?))
    }

    pub fn open_in_memory() -> Result<Self, ContribError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ContribError> {
        self.conn.lock().map_err(|_| ContribError::LockPoisoned)
    }
}

impl ContributionStore for SqliteStore {
    fn is_commit_processed(&self, project: &str, commit: &str) -> Result<bool, ContribError> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM processed_commits WHERE project = ?1 AND commit_id = ?2)",
            params![project, commit],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn record_commit(
        &self,
        commit: &CommitRecord,
        observations: &[ActionObservation],
    ) -> Result<bool, ContribError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().timestamp();

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO processed_commits (project, commit_id, developer, processed_at) VALUES (?1, ?2, ?3, ?4)",
            params![commit.project, commit.id, commit.committer, now],
        )?;

        if inserted == 0 {
            return Ok(false);
        }

        tx.execute(
            "
            INSERT INTO contrib_counters (name, value) VALUES (?1, 1)
            ON CONFLICT(name) DO UPDATE SET value = value + 1
            ",
            params![PROCESSED_COMMITS_COUNTER],
        )?;

        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO contrib_actions (project, commit_id, developer, action_type, total)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(project, commit_id, developer, action_type) DO UPDATE SET
                    total = total + excluded.total
                ",
            )?;
            for observation in observations {
                stmt.execute(params![
                    commit.project,
                    observation.commit,
                    observation.developer,
                    observation.action.code(),
                    observation.magnitude as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn processed_commit_count(&self) -> Result<u64, ContribError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM processed_commits", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn commit_sequence(&self) -> Result<u64, ContribError> {
        let conn = self.lock()?;
        let value: Option<i64> = conn
            .query_row(
                "SELECT value FROM contrib_counters WHERE name = ?1",
                params![PROCESSED_COMMITS_COUNTER],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0).max(0) as u64)
    }

    fn type_totals(&self) -> Result<TypeTotals, ContribError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT action_type, SUM(total) FROM contrib_actions GROUP BY action_type")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        collect_totals(rows)
    }

    fn developer_totals(&self, developer: &str) -> Result<DeveloperTotals, ContribError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT action_type, SUM(total) FROM contrib_actions WHERE developer = ?1 GROUP BY action_type",
        )?;
        let rows = stmt.query_map(params![developer], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        collect_totals(rows)
    }

    fn weights(&self) -> Result<Vec<ActionWeight>, ContribError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT weight_key, weight, last_update_marker, updated_at FROM contrib_weights ORDER BY weight_key",
        )?;
        let weights = stmt
            .query_map([], read_weight_row)?
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        Ok(weights)
    }

    fn weight(&self, key: WeightKey) -> Result<Option<ActionWeight>, ContribError> {
        let conn = self.lock()?;
        let weight = conn
            .query_row(
                "SELECT weight_key, weight, last_update_marker, updated_at FROM contrib_weights WHERE weight_key = ?1",
                params![key.storage_key()],
                read_weight_row,
            )
            .optional()?;
        Ok(weight.flatten())
    }

    fn last_weight_update(&self) -> Result<Option<u64>, ContribError> {
        let conn = self.lock()?;
        let marker: Option<i64> = conn.query_row(
            "SELECT MAX(last_update_marker) FROM contrib_weights",
            [],
            |row| row.get(0),
        )?;
        Ok(marker.map(|m| m.max(0) as u64))
    }

    fn upsert_weights(&self, weights: &[ActionWeight]) -> Result<(), ContribError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO contrib_weights (weight_key, weight, last_update_marker, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(weight_key) DO UPDATE SET
                    weight = excluded.weight,
                    last_update_marker = excluded.last_update_marker,
                    updated_at = excluded.updated_at
                ",
            )?;
            for weight in weights {
                stmt.execute(params![
                    weight.key.storage_key(),
                    weight.weight,
                    weight.last_update_marker as i64,
                    weight.updated_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn cleanup_project(&self, project: &str) -> Result<usize, ContribError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM contrib_actions WHERE project = ?1", params![project])?;
        tx.execute("DELETE FROM processed_commits WHERE project = ?1", params![project])?;
        tx.commit()?;
        Ok(removed)
    }

    fn remove_all(&self) -> Result<(), ContribError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "DELETE FROM contrib_weights;
             DELETE FROM contrib_actions;
             DELETE FROM processed_commits;
             DELETE FROM contrib_counters;",
        )?;
        Ok(())
    }
}

fn collect_totals(
    rows: impl Iterator<Item = Result<(String, i64)>>,
) -> Result<TypeTotals, ContribError> {
    let mut totals = TypeTotals::new();
    for row in rows {
        let (code, total) = row?;
        match ActionType::from_code(&code) {
            Some(action) => {
                totals.insert(action, total.max(0) as u64);
            }
            None => log::warn!("Ignoring unknown action type {code} in state database"),
        }
    }
    Ok(totals)
}

fn read_weight_row(row: &rusqlite::Row<'_>) -> Result<Option<ActionWeight>> {
    let raw_key: String = row.get(0)?;
    let Some(key) = WeightKey::from_storage_key(&raw_key) else {
        return Ok(None);
    };
    Ok(Some(ActionWeight {
        key,
        weight: row.get(1)?,
        last_update_marker: row.get::<_, i64>(2)?.max(0) as u64,
        updated_at: row.get(3)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::action::ActionCategory;

    fn commit(project: &str, id: &str, developer: &str) -> CommitRecord {
        CommitRecord {
            id: id.to_string(),
            project: project.to_string(),
            committer: developer.to_string(),
            message: String::new(),
            files: Vec::new(),
        }
    }

    fn observation(commit: &CommitRecord, action: ActionType, magnitude: u64) -> ActionObservation {
        ActionObservation {
            developer: commit.committer.clone(),
            commit: commit.id.clone(),
            action,
            magnitude,
        }
    }

    #[test]
    fn schema_initializes_with_expected_version() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        initialize_schema(&conn).expect("schema init");
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("schema version");
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn record_commit_accumulates_per_developer_and_type() {
        let store = SqliteStore::open_in_memory().expect("store");
        let c1 = commit("p", "r1", "alice");
        let c2 = commit("p", "r2", "alice");

        assert!(store
            .record_commit(&c1, &[observation(&c1, ActionType::CAL, 10), observation(&c1, ActionType::CNS, 1)])
            .expect("record r1"));
        assert!(store
            .record_commit(&c2, &[observation(&c2, ActionType::CAL, 5)])
            .expect("record r2"));

        let totals = store.developer_totals("alice").expect("totals");
        assert_eq!(totals[&ActionType::CAL], 15);
        assert_eq!(totals[&ActionType::CNS], 1);
        assert!(store.developer_totals("bob").expect("totals").is_empty());
        assert_eq!(store.processed_commit_count().expect("count"), 2);
    }

    #[test]
    fn recording_the_same_commit_twice_is_ignored() {
        let store = SqliteStore::open_in_memory().expect("store");
        let c1 = commit("p", "r1", "alice");
        let observations = [observation(&c1, ActionType::CBF, 1)];

        assert!(store.record_commit(&c1, &observations).expect("first"));
        assert!(!store.record_commit(&c1, &observations).expect("second"));
        assert!(store.is_commit_processed("p", "r1").expect("processed"));
        assert_eq!(store.type_totals().expect("totals")[&ActionType::CBF], 1);
    }

    #[test]
    fn migration_seeds_sequence_from_existing_ledger() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        apply_migration_1(&conn).expect("migration 1");
        apply_migration_2(&conn).expect("migration 2");
        conn.pragma_update(None, "user_version", 2).expect("user_version");
        conn.execute(
            "INSERT INTO processed_commits (project, commit_id, developer, processed_at) VALUES ('p', 'r1', 'alice', 0)",
            [],
        )
        .expect("seed ledger");

        initialize_schema(&conn).expect("upgrade");
        let store = SqliteStore::from_connection(conn);
        assert_eq!(store.commit_sequence().expect("sequence"), 1);

        let c2 = commit("p", "r2", "alice");
        store.record_commit(&c2, &[]).expect("record r2");
        assert_eq!(store.commit_sequence().expect("sequence"), 2);
    }

    #[test]
    fn weights_upsert_and_report_last_marker() {
        let store = SqliteStore::open_in_memory().expect("store");
        assert!(store.last_weight_update().expect("marker").is_none());

        let key = WeightKey::Category(ActionCategory::C);
        let first = ActionWeight { key, weight: 40.0, last_update_marker: 1, updated_at: 10 };
        store.upsert_weights(&[first]).expect("insert");
        let second = ActionWeight { key, weight: 60.0, last_update_marker: 151, updated_at: 20 };
        store.upsert_weights(&[second.clone()]).expect("update");

        assert_eq!(store.weight(key).expect("weight"), Some(second));
        assert_eq!(store.weights().expect("weights").len(), 1);
        assert_eq!(store.last_weight_update().expect("marker"), Some(151));
        assert!(store.weight(WeightKey::Type(ActionType::CNS)).expect("weight").is_none());
    }

    #[test]
    fn cleanup_removes_only_the_given_project() {
        let store = SqliteStore::open_in_memory().expect("store");
        let a = commit("alpha", "r1", "alice");
        let b = commit("beta", "r1", "alice");
        store.record_commit(&a, &[observation(&a, ActionType::CDF, 2)]).expect("alpha");
        store.record_commit(&b, &[observation(&b, ActionType::CDF, 3)]).expect("beta");

        assert_eq!(store.cleanup_project("alpha").expect("cleanup"), 1);
        assert!(!store.is_commit_processed("alpha", "r1").expect("alpha processed"));
        assert!(store.is_commit_processed("beta", "r1").expect("beta processed"));
        assert_eq!(store.developer_totals("alice").expect("totals")[&ActionType::CDF], 3);

        assert_eq!(store.processed_commit_count().expect("count"), 1);
        assert_eq!(store.commit_sequence().expect("sequence"), 2);

        store.remove_all().expect("remove all");
        assert_eq!(store.processed_commit_count().expect("count"), 0);
        assert_eq!(store.commit_sequence().expect("sequence"), 0);
        assert!(store.type_totals().expect("totals").is_empty());
    }
}
