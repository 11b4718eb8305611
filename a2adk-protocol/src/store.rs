// ABOUTME: TaskStore trait and the in-memory implementation used by the request handler.
// ABOUTME: Tasks are keyed by id and replaced wholesale on every save.

use crate::types::Task;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn save(&self, task: Task) -> Result<()>;

    async fn get(&self, task_id: &str) -> Result<Option<Task>>;

    async fn delete(&self, task_id: &str) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, task: Task) -> Result<()> {
        self.tasks.write().await.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        self.tasks.write().await.remove(task_id);
        Ok(())
    }
}
