//! In-memory task store (non-persistent).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore};
use crate::task::{NewTask, Task, TaskFilter, TaskPatch, TaskSort};

/// Insertion-ordered task list behind a lock.
#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing tasks, keeping their order.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(tasks)),
        }
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        match filter.sort {
            Some(TaskSort::Alphabetical) => {
                tasks.sort_by_key(|t| t.title.to_lowercase());
            }
            Some(TaskSort::Priority) => {
                tasks.sort_by_key(|t| std::cmp::Reverse(t.priority as u8));
            }
            Some(TaskSort::DueDate) => {
                // Undated tasks go last.
                tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date));
            }
            None => {}
        }
        Ok(tasks)
    }

    async fn get(&self, id: &str) -> Result<Task, StoreError> {
        self.tasks
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create(&self, new: &NewTask) -> Result<Task, StoreError> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Api {
                status: 422,
                detail: "title must not be empty".to_string(),
            });
        }
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: new.title.clone(),
            description: Some(new.description.clone()).filter(|d| !d.is_empty()),
            status: Default::default(),
            priority: new.priority,
            due_date: new.due_date,
            tags: new.tags.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(task);
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskStatus};

    #[test]
    fn create_update_delete_cycle() {
        let store = InMemoryTaskStore::new();
        tokio_test::block_on(async {
            let task = store
                .create(&NewTask::new("Buy milk").with_priority(Priority::High))
                .await
                .unwrap();
            assert_eq!(task.status, TaskStatus::Pending);
            assert_eq!(task.description, None);

            let updated = store
                .update(&task.id, &TaskPatch::status(TaskStatus::Completed))
                .await
                .unwrap();
            assert!(updated.is_completed());
            assert_eq!(updated.priority, Priority::High);

            let toggled = store.toggle(&task.id).await.unwrap();
            assert_eq!(toggled.status, TaskStatus::Pending);

            store.delete(&task.id).await.unwrap();
            assert!(store.is_empty().await);
            assert!(matches!(
                store.delete(&task.id).await,
                Err(StoreError::NotFound(_))
            ));
        });
    }

    #[test]
    fn list_filters_and_sorts() {
        let store = InMemoryTaskStore::new();
        tokio_test::block_on(async {
            for (title, priority) in [
                ("b chores", Priority::Low),
                ("A report", Priority::High),
                ("c gym", Priority::Medium),
            ] {
                store
                    .create(&NewTask::new(title).with_priority(priority))
                    .await
                    .unwrap();
            }

            let all = store.list(&TaskFilter::default()).await.unwrap();
            let titles: Vec<_> = all.iter().map(|t| t.title.as_str()).collect();
            assert_eq!(titles, vec!["b chores", "A report", "c gym"]);

            let sorted = store
                .list(&TaskFilter {
                    sort: Some(TaskSort::Alphabetical),
                    ..TaskFilter::default()
                })
                .await
                .unwrap();
            assert_eq!(sorted[0].title, "A report");

            let by_priority = store
                .list(&TaskFilter {
                    sort: Some(TaskSort::Priority),
                    ..TaskFilter::default()
                })
                .await
                .unwrap();
            assert_eq!(by_priority[0].priority, Priority::High);

            let keyword = store
                .list(&TaskFilter {
                    keyword: Some("GYM".to_string()),
                    ..TaskFilter::default()
                })
                .await
                .unwrap();
            assert_eq!(keyword.len(), 1);
        });
    }

    #[test]
    fn empty_title_is_rejected() {
        let store = InMemoryTaskStore::new();
        let err = tokio_test::block_on(store.create(&NewTask::new("  "))).unwrap_err();
        assert_eq!(err.status(), Some(422));
    }
}
