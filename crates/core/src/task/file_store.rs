//! File-based task storage implementation
//!
//! Stores tasks as JSON in a file on disk.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::model::{Task, TaskId, TaskStatus};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of tasks
    cache: RwLock<HashMap<TaskId, Task>>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let tasks: Vec<Task> = serde_json::from_str(&content)?;
            tasks.into_iter().map(|t| (t.id, t)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Persist the cache to disk
    async fn persist(&self) -> Result<()> {
        let cache = self.cache.read().await;
        let tasks: Vec<&Task> = cache.values().collect();
        let content = serde_json::to_string_pretty(&tasks)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        {
            let mut cache = self.cache.write().await;
            if cache.contains_key(&task.id) {
                return Err(Error::InvalidInput(format!(
                    "Task with ID {} already exists",
                    task.id
                )));
            }
            cache.insert(task.id, task.clone());
        }
        self.persist().await?;
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let cache = self.cache.read().await;
        Ok(cache.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        let mut tasks: Vec<Task> = cache.values().cloned().collect();
        // Sort by created_at descending (newest first)
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn update(&self, mut task: Task) -> Result<Task> {
        task.updated_at = Utc::now();
        {
            let mut cache = self.cache.write().await;
            if !cache.contains_key(&task.id) {
                return Err(Error::TaskNotFound(task.id.to_string()));
            }
            cache.insert(task.id, task.clone());
        }
        self.persist().await?;
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.remove(&id).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        let mut tasks: Vec<Task> = cache
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPriority;
    use crate::user::UserId;
    use tempfile::TempDir;

    async fn create_test_store() -> (FileTaskStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");
        let store = FileTaskStore::new(&path).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_create_task() {
        let (store, _temp) = create_test_store().await;

        let id = UserId::new();
        let task = Task::new("Test task", id, id).with_description("A test description");
        let created = store.create(task.clone()).await.unwrap();

        assert_eq!(created.id, task.id);
        assert_eq!(created.title, "Test task");
        assert_eq!(created.description, "A test description");
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at() {
        let (store, _temp) = create_test_store().await;

        let id = UserId::new();
        let task = Task::new("Test task", id, id);
        let created = store.create(task).await.unwrap();

        let mut edited = created.clone();
        edited.priority = TaskPriority::High;
        let updated = store.update(edited).await.unwrap();

        assert_eq!(updated.priority, TaskPriority::High);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_find_by_status() {
        let (store, _temp) = create_test_store().await;

        let id = UserId::new();
        store.create(Task::new("A", id, id)).await.unwrap();
        store
            .create(Task::new("B", id, id).with_status(TaskStatus::Completed))
            .await
            .unwrap();

        let pending = store.find_by_status(TaskStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "A");
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");

        let id = UserId::new();
        let task = Task::new("Persisted", id, id);
        {
            let store = FileTaskStore::new(&path).await.unwrap();
            store.create(task.clone()).await.unwrap();
        }

        let reloaded = FileTaskStore::new(&path).await.unwrap();
        let fetched = reloaded.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Persisted");
        assert_eq!(fetched.assigned_to, id);
    }
}
