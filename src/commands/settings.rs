use crate::error::ContribError;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;

pub const CONFIG_CMF_THRESHOLD: &str = "CMF_threshold";
pub const CONFIG_WEIGHT_UPDATE_INTERVAL: &str = "Weights_Update_Interval";

pub const DEFAULT_CMF_THRESHOLD: i64 = 5;
pub const DEFAULT_WEIGHT_UPDATE_INTERVAL: i64 = 150;

/// Validated integer options driving commit processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSettings {
    /// Number of committed files above which the developer is penalized.
    pub many_files_threshold: usize,
    /// Number of processed commits between weight updates.
    pub weight_update_interval: u64,
}

impl Default for MetricSettings {
    fn default() -> Self {
        Self {
            many_files_threshold: DEFAULT_CMF_THRESHOLD as usize,
            weight_update_interval: DEFAULT_WEIGHT_UPDATE_INTERVAL as u64,
        }
    }
}

impl MetricSettings {
    /// Read both options from a settings object. Absent or non-positive
    /// values are rejected.
    pub fn from_value(settings: &Value) -> Result<Self, ContribError> {
        let many_files_threshold = positive_integer(settings, CONFIG_CMF_THRESHOLD)?;
        let weight_update_interval = positive_integer(settings, CONFIG_WEIGHT_UPDATE_INTERVAL)?;
        Ok(Self {
            many_files_threshold: many_files_threshold as usize,
            weight_update_interval: weight_update_interval as u64,
        })
    }
}

fn positive_integer(settings: &Value, key: &str) -> Result<i64, ContribError> {
    let raw = settings.get(key);
    match raw.and_then(Value::as_i64) {
        Some(value) if value > 0 => Ok(value),
        _ => {
            let shown = raw.map(Value::to_string).unwrap_or_else(|| "absent".to_string());
            log::error!("Plug-in configuration option {key} not usable: {shown}");
            Err(ContribError::InvalidConfiguration {
                key: key.to_string(),
                value: shown,
            })
        }
    }
}

pub fn load_effective_settings(workspace_path: &str) -> Result<MetricSettings, ContribError> {
    let settings = load_settings_from_disk(workspace_path)?;
    MetricSettings::from_value(&settings)
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value, ContribError> {
    let path = settings_path(workspace_path);
    ensure_settings_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| ContribError::Settings(format!("Failed to read settings.json: {e}")))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| json!({}))
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value, ContribError> {
    let path = settings_path(workspace_path);
    ensure_settings_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path)
        .join(".devcontrib")
        .join("settings.json")
}

fn ensure_settings_dir(workspace_path: &str) -> Result<(), ContribError> {
    let dir = Path::new(workspace_path).join(".devcontrib");
    fs::create_dir_all(&dir)
        .map_err(|e| ContribError::Settings(format!("Failed to create .devcontrib directory: {e}")))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), ContribError> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| ContribError::Settings(format!("Failed to serialize settings: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| ContribError::Settings(format!("Failed to write settings.json: {e}")))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);
    normalize_integers(&mut out);

    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        CONFIG_CMF_THRESHOLD: DEFAULT_CMF_THRESHOLD,
        CONFIG_WEIGHT_UPDATE_INTERVAL: DEFAULT_WEIGHT_UPDATE_INTERVAL,
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

/// Integer options may be written as strings ("5").
/// Values that do not parse are left as-is so validation reports them.
fn normalize_integers(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    for key in [CONFIG_CMF_THRESHOLD, CONFIG_WEIGHT_UPDATE_INTERVAL] {
        let parsed = obj
            .get(key)
            .and_then(Value::as_str)
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        if let Some(value) = parsed {
            obj.insert(key.to_string(), json!(value));
        }
    }
}
