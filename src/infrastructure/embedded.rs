//! Embedded backend: each collection is one JSON value in the local key-value table.
//!
//! Collections are loaded once when the store is opened and every read is served from
//! memory. Writes persist the new collection first and only then swap the in-memory
//! copy, so a failed write leaves both sides as they were.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::domain::{Column, RepoResult, Task, Theme};
use crate::repository::{ColumnRepository, DataProvider, SettingsRepository, TaskRepository};

use super::db;

pub const TASKS_KEY: &str = "kanban-tasks";
pub const COLUMNS_KEY: &str = "kanban-columns";
pub const THEME_KEY: &str = "app-theme";

struct KvCell<T> {
    key: &'static str,
    pool: SqlitePool,
    value: Mutex<T>,
}

impl<T> KvCell<T>
where
    T: Serialize + DeserializeOwned + Clone + Default + Send,
{
    async fn load(pool: SqlitePool, key: &'static str) -> RepoResult<Self> {
        let value = match db::kv_get(&pool, key).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => T::default(),
        };

        Ok(Self {
            key,
            pool,
            value: Mutex::new(value),
        })
    }

    async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.value.lock().await;
        f(&*guard)
    }

    async fn write(&self, f: impl FnOnce(&mut T)) -> RepoResult<()> {
        let mut guard = self.value.lock().await;
        let mut next = guard.clone();
        f(&mut next);

        let raw = serde_json::to_string(&next)?;
        db::kv_put(&self.pool, self.key, &raw).await?;

        *guard = next;
        Ok(())
    }
}

pub struct EmbeddedTaskRepository {
    tasks: KvCell<Vec<Task>>,
}

#[async_trait]
impl TaskRepository for EmbeddedTaskRepository {
    async fn get_tasks(&self) -> RepoResult<Vec<Task>> {
        Ok(self.tasks.read(|tasks| tasks.clone()).await)
    }

    async fn get_task_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        Ok(self
            .tasks
            .read(|tasks| tasks.iter().find(|t| t.id == id).cloned())
            .await)
    }

    async fn create_task(&self, task: &Task) -> RepoResult<Task> {
        self.tasks.write(|tasks| tasks.push(task.clone())).await?;
        Ok(task.clone())
    }

    async fn update_task(&self, task: &Task) -> RepoResult<Task> {
        // Unknown ids are silently ignored.
        self.tasks
            .write(|tasks| {
                if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
            })
            .await?;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> RepoResult<()> {
        self.tasks.write(|tasks| tasks.retain(|t| t.id != id)).await
    }

    async fn get_tasks_by_column(&self, column_id: &str) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .read(|tasks| {
                tasks
                    .iter()
                    .filter(|t| t.column_id == column_id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}

pub struct EmbeddedColumnRepository {
    columns: KvCell<Vec<Column>>,
}

#[async_trait]
impl ColumnRepository for EmbeddedColumnRepository {
    async fn get_columns(&self) -> RepoResult<Vec<Column>> {
        Ok(self.columns.read(|columns| columns.clone()).await)
    }

    async fn get_column_by_id(&self, id: &str) -> RepoResult<Option<Column>> {
        Ok(self
            .columns
            .read(|columns| columns.iter().find(|c| c.id == id).cloned())
            .await)
    }

    async fn create_column(&self, column: &Column) -> RepoResult<Column> {
        self.columns.write(|columns| columns.push(column.clone())).await?;
        Ok(column.clone())
    }

    async fn update_column(&self, column: &Column) -> RepoResult<Column> {
        self.columns
            .write(|columns| {
                if let Some(slot) = columns.iter_mut().find(|c| c.id == column.id) {
                    *slot = column.clone();
                }
            })
            .await?;
        Ok(column.clone())
    }

    async fn delete_column(&self, id: &str) -> RepoResult<()> {
        self.columns.write(|columns| columns.retain(|c| c.id != id)).await
    }

    async fn reorder_columns(&self, columns: &[Column]) -> RepoResult<Vec<Column>> {
        // Stored verbatim: callers hand in an already densified sequence.
        let next = columns.to_vec();
        self.columns.write(|stored| *stored = next.clone()).await?;
        Ok(next)
    }
}

pub struct EmbeddedSettingsRepository {
    theme: KvCell<Theme>,
}

#[async_trait]
impl SettingsRepository for EmbeddedSettingsRepository {
    async fn get_theme(&self) -> RepoResult<Theme> {
        Ok(self.theme.read(|theme| *theme).await)
    }

    async fn set_theme(&self, theme: Theme) -> RepoResult<Theme> {
        self.theme.write(|stored| *stored = theme).await?;
        Ok(theme)
    }
}

pub struct EmbeddedProvider {
    pool: SqlitePool,
    tasks: EmbeddedTaskRepository,
    columns: EmbeddedColumnRepository,
    settings: EmbeddedSettingsRepository,
}

impl EmbeddedProvider {
    pub async fn open(database_url: &str) -> RepoResult<Self> {
        let pool = db::init_db(database_url).await?;
        Self::with_pool(pool).await
    }

    /// Expects the `kv` table to exist already.
    pub async fn with_pool(pool: SqlitePool) -> RepoResult<Self> {
        Ok(Self {
            tasks: EmbeddedTaskRepository {
                tasks: KvCell::load(pool.clone(), TASKS_KEY).await?,
            },
            columns: EmbeddedColumnRepository {
                columns: KvCell::load(pool.clone(), COLUMNS_KEY).await?,
            },
            settings: EmbeddedSettingsRepository {
                theme: KvCell::load(pool.clone(), THEME_KEY).await?,
            },
            pool,
        })
    }
}

#[async_trait]
impl DataProvider for EmbeddedProvider {
    fn name(&self) -> &str {
        "embedded"
    }

    fn tasks(&self) -> &dyn TaskRepository {
        &self.tasks
    }

    fn columns(&self) -> &dyn ColumnRepository {
        &self.columns
    }

    fn settings(&self) -> &dyn SettingsRepository {
        &self.settings
    }

    async fn initialize(&self) -> RepoResult<()> {
        tracing::info!(provider = self.name(), "Provider initialized with local storage");
        Ok(())
    }

    async fn disconnect(&self) {
        self.pool.close().await;
        tracing::info!(provider = self.name(), "Provider disconnected");
    }
}
