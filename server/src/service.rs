// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use common::{
    CreateTaskPayload, ListTasksQuery, Priority, Task, TaskFilter, Theme, UpdateTaskPayload,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::store::TaskStore;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const INVALID_DATE_FORMAT: &str = "Invalid date format. Use YYYY-MM-DD";
pub const INVALID_PRIORITY: &str = r#"Priority must be "low", "medium", or "high""#;
pub const INVALID_THEME: &str = "Invalid theme";

/// Errors returned by [`TaskService`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing or malformed input. The message is meant for the client.
    #[error("{0}")]
    Validation(&'static str),

    #[error("Task not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Task operations over a [`TaskStore`].
///
/// Every call reloads the full collection. Mutations run the whole
/// load-modify-save cycle under a single writer lock so two concurrent
/// requests cannot overwrite each other's changes.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    write_lock: Mutex<()>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the tasks matching every active filter, in stored order.
    /// A malformed `due_date` is rejected before the store is read.
    pub async fn list(&self, query: &ListTasksQuery) -> ServiceResult<Vec<Task>> {
        let filter = TaskFilter::from_query(query).map_err(|e| {
            debug!("Rejecting list request: {}", e);
            ServiceError::Validation(INVALID_DATE_FORMAT)
        })?;
        debug!("Listing tasks with filter: {:?}", filter);
        let tasks = self.store.load().await?;
        Ok(filter.apply(tasks))
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Task> {
        self.store
            .load()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(ServiceError::NotFound)
    }

    /// Creates a task. `title` is required; an unknown priority falls back
    /// to `medium`.
    pub async fn create(&self, payload: CreateTaskPayload) -> ServiceResult<Task> {
        let title = match payload.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(ServiceError::Validation(TITLE_REQUIRED)),
        };
        let priority = payload
            .priority
            .as_ref()
            .and_then(Priority::from_value)
            .unwrap_or_default();
        let task = Task::new(
            title,
            payload.description.unwrap_or_default(),
            payload.due_date,
            priority,
        );

        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load().await?;
        tasks.push(task.clone());
        self.store.save(&tasks).await?;

        info!("Task created with ID: {}", task.id);
        Ok(task)
    }

    /// Applies a partial update. See [`Task::apply_update`] for the
    /// per-field rules.
    pub async fn update(&self, id: &str, payload: UpdateTaskPayload) -> ServiceResult<Task> {
        debug!("Updating task {} with {:?}", id, payload);
        self.modify(id, move |task| {
            task.apply_update(payload);
            Ok(())
        })
        .await
    }

    /// Removes the task if it exists. Deleting an unknown id is not an
    /// error; the collection is saved either way. Returns whether a task
    /// was removed.
    pub async fn delete(&self, id: &str) -> ServiceResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load().await?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() != before;
        self.store.save(&tasks).await?;

        if removed {
            info!("Task with ID {} deleted.", id);
        } else {
            debug!("No task with ID {} to delete.", id);
        }
        Ok(removed)
    }

    pub async fn set_completed(&self, id: &str, completed: bool) -> ServiceResult<Task> {
        self.modify(id, |task| {
            task.completed = completed;
            Ok(())
        })
        .await
    }

    /// Unlike [`TaskService::update`], an unknown priority is rejected.
    pub async fn set_priority(&self, id: &str, priority: Option<&str>) -> ServiceResult<Task> {
        self.modify(id, |task| {
            task.priority = priority
                .and_then(Priority::from_name)
                .ok_or(ServiceError::Validation(INVALID_PRIORITY))?;
            Ok(())
        })
        .await
    }

    pub async fn set_theme(&self, id: &str, theme: Option<&str>) -> ServiceResult<Task> {
        self.modify(id, |task| {
            task.theme = theme
                .and_then(Theme::from_name)
                .ok_or(ServiceError::Validation(INVALID_THEME))?;
            Ok(())
        })
        .await
    }

    // Load, find `id`, mutate it, save. Existence is checked before `f` runs,
    // so a missing task wins over invalid input. Nothing is saved if `f` fails.
    async fn modify<F>(&self, id: &str, f: F) -> ServiceResult<Task>
    where
        F: FnOnce(&mut Task) -> ServiceResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ServiceError::NotFound)?;
        f(task)?;
        let updated = task.clone();
        self.store.save(&tasks).await?;

        info!("Task with ID {} updated.", id);
        Ok(updated)
    }
}
