// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use common::Task;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info, warn};

/// Persistence boundary for the task collection.
///
/// The whole collection is the unit of persistence: `load` returns every
/// task in insertion order and `save` replaces everything that was stored.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Task>>;
    async fn save(&self, tasks: &[Task]) -> Result<()>;
}

/// What to do when the backing file exists but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Treat the file as an empty collection and log a warning.
    /// The next save overwrites the unreadable content.
    #[default]
    Lenient,
    /// Report the decode failure as an error.
    Strict,
}

/// Stores the collection as a pretty-printed JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
    policy: LoadPolicy,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, policy: LoadPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }
}

#[async_trait]
impl TaskStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Task>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "Task file {} does not exist yet, starting empty.",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read task file {}", self.path.display())
                });
            }
        };

        match serde_json::from_slice::<Vec<Task>>(&data) {
            Ok(tasks) => {
                debug!("Loaded {} tasks from {}", tasks.len(), self.path.display());
                Ok(tasks)
            }
            Err(e) if self.policy == LoadPolicy::Lenient => {
                warn!(
                    "Task file {} is not a valid task list ({}), treating it as empty.",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e).with_context(|| {
                format!("Failed to decode task file {}", self.path.display())
            }),
        }
    }

    async fn save(&self, tasks: &[Task]) -> Result<()> {
        let data = encode_pretty(tasks)?;

        // Ensure the directory exists before saving the file
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, data)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace task file {}", self.path.display()))?;

        info!("Saved {} tasks to {}", tasks.len(), self.path.display());
        Ok(())
    }
}

/// Serializes the collection with 4-space indentation.
pub fn encode_pretty(tasks: &[Task]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    tasks
        .serialize(&mut ser)
        .context("Failed to serialize tasks")?;
    Ok(buf)
}

// `tasks.json` -> `tasks.json.tmp`, in the same directory so the rename stays
// on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("tasks"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Keeps the collection in memory. Used by tests and anywhere a throwaway
/// store is enough.
#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
        }
    }

    /// Copy of what is currently stored.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.read().clone())
    }

    async fn save(&self, tasks: &[Task]) -> Result<()> {
        *self.tasks.write() = tasks.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Priority;
    use tempfile::tempdir;

    fn sample_tasks() -> Vec<Task> {
        let mut done = Task::new(
            "Write report".to_string(),
            "Quarterly numbers".to_string(),
            Some("2025-06-30".to_string()),
            Priority::High,
        );
        done.completed = true;
        vec![
            Task::new("Buy milk".to_string(), String::new(), None, Priority::Medium),
            done,
        ]
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("tasks.json"), LoadPolicy::Strict);

        let tasks = store.load().await.unwrap();

        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("tasks.json"), LoadPolicy::Lenient);
        let tasks = sample_tasks();

        store.save(&tasks).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, tasks);
        assert!(!dir.path().join("tasks.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database").join("tasks.json");
        let store = JsonFileStore::new(&path, LoadPolicy::Lenient);

        store.save(&sample_tasks()).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_saved_file_is_indented_json_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let store = JsonFileStore::new(&path, LoadPolicy::Lenient);

        store.save(&sample_tasks()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n    {\n        \"id\": "));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    /// Task file as written by the earlier front-end server: timestamps
    /// without offset, a priority outside the known set.
    const LEGACY_TASKS_JSON: &str = r#"[
    {
        "id": "5b1d7f0e-3a43-4c52-9d0f-1f6c2a1e9b10",
        "title": "Water plants",
        "description": "",
        "due_date": null,
        "priority": "medium",
        "completed": false,
        "theme": "standard",
        "created_at": "2025-01-01T10:00:00.123456"
    },
    {
        "id": "0c6e8a52-7d9b-4a1e-8f3c-6b2d4e5f7a81",
        "title": "File taxes",
        "description": "Before April",
        "due_date": "2025-04-15",
        "priority": "urgent",
        "completed": true,
        "theme": "darker",
        "created_at": "2025-01-02T08:30:00"
    }
]"#;

    #[tokio::test]
    async fn test_load_legacy_file_keeps_every_task() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, LEGACY_TASKS_JSON).unwrap();
        let store = JsonFileStore::new(&path, LoadPolicy::Strict);

        let tasks = store.load().await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "File taxes");
        assert_eq!(tasks[1].due_date.as_deref(), Some("2025-04-15"));
        assert_eq!(tasks[1].priority, Priority::Medium);
        assert!(tasks[1].completed);
        assert_eq!(tasks[1].theme, common::Theme::Darker);
    }

    #[tokio::test]
    async fn test_corrupt_file_lenient_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path, LoadPolicy::Lenient);

        let tasks = store.load().await.unwrap();

        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_strict_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "").unwrap();
        let store = JsonFileStore::new(&path, LoadPolicy::Strict);

        let err = store.load().await.unwrap_err();

        assert!(err.to_string().contains("Failed to decode task file"));
    }

    #[tokio::test]
    async fn test_memory_store_replaces_contents() {
        let store = MemoryStore::with_tasks(sample_tasks());
        assert_eq!(store.load().await.unwrap().len(), 2);

        store.save(&[]).await.unwrap();

        assert!(store.snapshot().is_empty());
    }
}
