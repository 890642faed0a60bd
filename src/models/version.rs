use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    /// Sequence number of the version within its project.
    pub number: i64,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// Project versions as listed by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionsList(pub Vec<Version>);

impl VersionsList {
    pub fn new(versions: Vec<Version>) -> Self {
        Self(versions)
    }

    /// Versions keyed by version number. Later entries win on duplicate numbers.
    pub fn sort_by_number(&self) -> BTreeMap<i64, &Version> {
        self.0.iter().map(|v| (v.number, v)).collect()
    }

    /// Versions keyed by id. Later entries win on duplicate ids.
    pub fn sort_by_id(&self) -> BTreeMap<i64, &Version> {
        self.0.iter().map(|v| (v.id, v)).collect()
    }

    pub fn version_by_number(&self, number: Option<i64>) -> Option<&Version> {
        let number = number?;
        self.sort_by_number().get(&number).copied()
    }

    pub fn version_by_id(&self, id: i64) -> Option<&Version> {
        self.sort_by_id().get(&id).copied()
    }

    /// Version numbers indexed by version id.
    pub fn version_numbers(&self) -> HashMap<i64, i64> {
        self.0.iter().map(|v| (v.id, v.number)).collect()
    }
}
