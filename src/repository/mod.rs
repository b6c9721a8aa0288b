//! Storage contracts shared by every backend adapter.
//!
//! The sync context only ever talks to a [`DataProvider`]; which adapter sits behind
//! it is decided once at startup.

use async_trait::async_trait;

use crate::domain::{Column, RepoResult, Task, Theme};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_tasks(&self) -> RepoResult<Vec<Task>>;

    /// Returns `Ok(None)` when no task has this id.
    async fn get_task_by_id(&self, id: &str) -> RepoResult<Option<Task>>;

    async fn create_task(&self, task: &Task) -> RepoResult<Task>;

    /// Full replace by id.
    async fn update_task(&self, task: &Task) -> RepoResult<Task>;

    async fn delete_task(&self, id: &str) -> RepoResult<()>;

    async fn get_tasks_by_column(&self, column_id: &str) -> RepoResult<Vec<Task>>;
}

#[async_trait]
pub trait ColumnRepository: Send + Sync {
    async fn get_columns(&self) -> RepoResult<Vec<Column>>;

    /// Returns `Ok(None)` when no column has this id.
    async fn get_column_by_id(&self, id: &str) -> RepoResult<Option<Column>>;

    async fn create_column(&self, column: &Column) -> RepoResult<Column>;

    async fn update_column(&self, column: &Column) -> RepoResult<Column>;

    async fn delete_column(&self, id: &str) -> RepoResult<()>;

    /// Persists the full new column sequence and returns it with each `order`
    /// equal to its position.
    async fn reorder_columns(&self, columns: &[Column]) -> RepoResult<Vec<Column>>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_theme(&self) -> RepoResult<Theme>;

    async fn set_theme(&self, theme: Theme) -> RepoResult<Theme>;
}

/// One backend: the three repositories plus connection lifecycle.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Backend identifier, e.g. `"embedded"`.
    fn name(&self) -> &str;

    fn tasks(&self) -> &dyn TaskRepository;

    fn columns(&self) -> &dyn ColumnRepository;

    fn settings(&self) -> &dyn SettingsRepository;

    /// Establishes the connection or verifies the backend is reachable.
    async fn initialize(&self) -> RepoResult<()>;

    /// Releases resources. Idempotent and infallible.
    async fn disconnect(&self);
}
