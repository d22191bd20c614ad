use crate::constants::MAX_HISTORY;
use crate::models::{HistoryEntry, Lookup, VariableSet};
use anyhow::Result;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;

const VARIABLES_FILE: &str = "variables.yaml";
const LOOKUPS_FILE: &str = "lookups.yaml";
const PATTERNS_FILE: &str = "patterns.yaml";
const HISTORY_FILE: &str = "history.yaml";

/// Manages the persisted artifacts: variables, lookups, field patterns
/// and request history
pub struct Storage {
    pub variables: VariableSet,
    pub lookups: Vec<Lookup>,
    /// Lowercased field name -> remembered fill value
    pub patterns: HashMap<String, String>,
    pub history: VecDeque<HistoryEntry>,
    config_dir: PathBuf,
}

impl Storage {
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".schemaquest");
        Self::with_dir(config_dir)
    }

    pub fn with_dir(config_dir: PathBuf) -> Self {
        let mut storage = Storage {
            variables: VariableSet::new("default"),
            lookups: Vec::new(),
            patterns: HashMap::new(),
            history: VecDeque::with_capacity(MAX_HISTORY),
            config_dir,
        };

        // Best-effort: a missing or unreadable store starts empty
        if let Err(e) = storage.load_all() {
            tracing::warn!(error = %e, "Could not load persisted state");
        }
        storage
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    // ========================
    // Variables
    // ========================

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.set(name, value);
        if let Err(e) = self.save_variables() {
            tracing::warn!(error = %e, "Could not save variables");
        }
    }

    pub fn save_variables(&self) -> Result<()> {
        self.ensure_dir()?;
        let path = self.config_dir.join(VARIABLES_FILE);
        fs::write(path, serde_yaml::to_string(&self.variables)?)?;
        Ok(())
    }

    // ========================
    // Lookups
    // ========================

    pub fn add_lookup(&mut self, lookup: Lookup) {
        // A re-saved name replaces the previous definition
        self.lookups.retain(|l| l.name != lookup.name);
        self.lookups.push(lookup);
        if let Err(e) = self.save_lookups() {
            tracing::warn!(error = %e, "Could not save lookups");
        }
    }

    pub fn save_lookups(&self) -> Result<()> {
        self.ensure_dir()?;
        let path = self.config_dir.join(LOOKUPS_FILE);
        fs::write(path, serde_yaml::to_string(&self.lookups)?)?;
        Ok(())
    }

    // ========================
    // Field patterns
    // ========================

    pub fn train_pattern(&mut self, field: &str, value: impl Into<String>) {
        self.patterns.insert(field.to_lowercase(), value.into());
        if let Err(e) = self.save_patterns() {
            tracing::warn!(error = %e, "Could not save patterns");
        }
    }

    pub fn save_patterns(&self) -> Result<()> {
        self.ensure_dir()?;
        let path = self.config_dir.join(PATTERNS_FILE);
        fs::write(path, serde_yaml::to_string(&self.patterns)?)?;
        Ok(())
    }

    // ========================
    // History
    // ========================

    /// Add entry to history, newest first, bounded
    pub fn add_to_history(&mut self, entry: HistoryEntry) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_back();
        }
        self.history.push_front(entry);
        if let Err(e) = self.save_history() {
            tracing::warn!(error = %e, "Could not save history");
        }
    }

    /// Get history item by index (0 = most recent)
    pub fn get_history(&self, index: usize) -> Option<&HistoryEntry> {
        self.history.get(index)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn save_history(&self) -> Result<()> {
        self.ensure_dir()?;
        let entries: Vec<&HistoryEntry> = self.history.iter().collect();
        let path = self.config_dir.join(HISTORY_FILE);
        fs::write(path, serde_yaml::to_string(&entries)?)?;
        Ok(())
    }

    // ========================
    // Loading
    // ========================

    fn load_all(&mut self) -> Result<()> {
        if !self.config_dir.exists() {
            return Ok(());
        }

        if let Ok(content) = fs::read_to_string(self.config_dir.join(VARIABLES_FILE)) {
            if let Ok(vars) = serde_yaml::from_str::<VariableSet>(&content) {
                self.variables = vars;
            }
        }
        if let Ok(content) = fs::read_to_string(self.config_dir.join(LOOKUPS_FILE)) {
            if let Ok(lookups) = serde_yaml::from_str::<Vec<Lookup>>(&content) {
                self.lookups = lookups;
            }
        }
        if let Ok(content) = fs::read_to_string(self.config_dir.join(PATTERNS_FILE)) {
            if let Ok(patterns) = serde_yaml::from_str::<HashMap<String, String>>(&content) {
                self.patterns = patterns;
            }
        }
        if let Ok(content) = fs::read_to_string(self.config_dir.join(HISTORY_FILE)) {
            if let Ok(entries) = serde_yaml::from_str::<Vec<HistoryEntry>>(&content) {
                self.history = entries.into_iter().take(MAX_HISTORY).collect();
            }
        }

        Ok(())
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    #[test]
    fn test_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        {
            let mut storage = Storage::with_dir(path.clone());
            storage.set_variable("token", "abc");
            storage.train_pattern("Email", "a@b.c");
            storage.add_lookup(Lookup {
                name: "users".to_string(),
                method: HttpMethod::GET,
                url: "https://api.local/users".to_string(),
                body: String::new(),
                value_path: "users[].id".to_string(),
                label_path: Some("users[].name".to_string()),
            });
            storage.add_to_history(HistoryEntry {
                method: HttpMethod::POST,
                url: "https://api.local/users".to_string(),
                endpoint_key: "POST /users".to_string(),
                status_code: Some(201),
                time_ms: 12,
                fields: [("name".to_string(), "Ada".to_string())].into(),
                timestamp: chrono::Utc::now(),
            });
        }

        let storage = Storage::with_dir(path);
        assert_eq!(storage.variables.get("token").unwrap(), "abc");
        // Pattern keys are lowercased for case-insensitive matching
        assert_eq!(storage.patterns.get("email").unwrap(), "a@b.c");
        assert_eq!(storage.lookups.len(), 1);
        assert_eq!(storage.history_len(), 1);
        assert_eq!(
            storage.get_history(0).unwrap().fields.get("name").unwrap(),
            "Ada"
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::with_dir(dir.path().to_path_buf());

        for i in 0..(MAX_HISTORY + 5) {
            storage.add_to_history(HistoryEntry {
                method: HttpMethod::GET,
                url: format!("https://api.local/{}", i),
                endpoint_key: "GET /x".to_string(),
                status_code: Some(200),
                time_ms: 1,
                fields: HashMap::new(),
                timestamp: chrono::Utc::now(),
            });
        }

        assert_eq!(storage.history_len(), MAX_HISTORY);
        // Newest first
        assert!(storage.get_history(0).unwrap().url.ends_with("/54"));
    }

    #[test]
    fn test_resaved_lookup_replaces_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::with_dir(dir.path().to_path_buf());

        for path in ["a[].id", "b[].id"] {
            storage.add_lookup(Lookup {
                name: "same".to_string(),
                method: HttpMethod::GET,
                url: "https://api.local".to_string(),
                body: String::new(),
                value_path: path.to_string(),
                label_path: None,
            });
        }

        assert_eq!(storage.lookups.len(), 1);
        assert_eq!(storage.lookups[0].value_path, "b[].id");
    }
}
