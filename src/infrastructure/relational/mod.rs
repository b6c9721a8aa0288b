//! Remote relational backend reached through its REST interface.
//!
//! Every row carries the owner id and every query filters on it, so one backend can
//! hold many boards side by side.

pub mod client;
pub mod rows;

use async_trait::async_trait;

use crate::domain::{Column, KanbanError, RepoResult, Task, Theme};
use crate::repository::{ColumnRepository, DataProvider, SettingsRepository, TaskRepository};

use client::{eq, Query, RestClient};
use rows::{ColumnRow, SettingsRow, TaskRow};

const TASKS_TABLE: &str = "tasks";
const COLUMNS_TABLE: &str = "columns";
const SETTINGS_TABLE: &str = "user_settings";

pub const DEFAULT_OWNER: &str = "anonymous";

#[derive(Debug, Clone, Default)]
pub struct RelationalConfig {
    pub url: String,
    pub api_key: String,
    pub owner_id: String,
}

pub struct RelationalTaskRepository {
    client: RestClient,
    owner: String,
}

impl RelationalTaskRepository {
    fn owned<'a>(&self, mut query: Query<'a>) -> Query<'a> {
        query.push(("user_id", eq(&self.owner)));
        query
    }

    fn by_id<'a>(&self, id: &str) -> Query<'a> {
        self.owned(vec![("id", eq(id))])
    }
}

#[async_trait]
impl TaskRepository for RelationalTaskRepository {
    async fn get_tasks(&self) -> RepoResult<Vec<Task>> {
        let query = self.owned(vec![
            ("select", "*".to_string()),
            ("order", "created_at.asc".to_string()),
        ]);
        let rows: Vec<TaskRow> = self.client.select(TASKS_TABLE, &query).await?;
        Ok(rows.into_iter().map(TaskRow::into_task).collect())
    }

    async fn get_task_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        let mut query = self.by_id(id);
        query.push(("select", "*".to_string()));
        let row: Option<TaskRow> = self.client.select_single(TASKS_TABLE, &query).await?;
        Ok(row.map(TaskRow::into_task))
    }

    async fn create_task(&self, task: &Task) -> RepoResult<Task> {
        let row: TaskRow = self
            .client
            .insert(TASKS_TABLE, &TaskRow::from_task(task, &self.owner))
            .await?;
        Ok(row.into_task())
    }

    async fn update_task(&self, task: &Task) -> RepoResult<Task> {
        let row: TaskRow = self
            .client
            .update(
                TASKS_TABLE,
                &self.by_id(&task.id),
                &TaskRow::from_task(task, &self.owner),
            )
            .await?;
        Ok(row.into_task())
    }

    async fn delete_task(&self, id: &str) -> RepoResult<()> {
        self.client.delete(TASKS_TABLE, &self.by_id(id)).await
    }

    async fn get_tasks_by_column(&self, column_id: &str) -> RepoResult<Vec<Task>> {
        let query = self.owned(vec![
            ("select", "*".to_string()),
            ("column_id", eq(column_id)),
            ("order", "created_at.asc".to_string()),
        ]);
        let rows: Vec<TaskRow> = self.client.select(TASKS_TABLE, &query).await?;
        Ok(rows.into_iter().map(TaskRow::into_task).collect())
    }
}

pub struct RelationalColumnRepository {
    client: RestClient,
    owner: String,
}

impl RelationalColumnRepository {
    fn by_id<'a>(&self, id: &str) -> Query<'a> {
        vec![("id", eq(id)), ("user_id", eq(&self.owner))]
    }
}

#[async_trait]
impl ColumnRepository for RelationalColumnRepository {
    async fn get_columns(&self) -> RepoResult<Vec<Column>> {
        let query = vec![
            ("select", "*".to_string()),
            ("user_id", eq(&self.owner)),
            ("order", "order.asc".to_string()),
        ];
        let rows: Vec<ColumnRow> = self.client.select(COLUMNS_TABLE, &query).await?;
        Ok(rows.into_iter().map(ColumnRow::into_column).collect())
    }

    async fn get_column_by_id(&self, id: &str) -> RepoResult<Option<Column>> {
        let mut query = self.by_id(id);
        query.push(("select", "*".to_string()));
        let row: Option<ColumnRow> = self.client.select_single(COLUMNS_TABLE, &query).await?;
        Ok(row.map(ColumnRow::into_column))
    }

    async fn create_column(&self, column: &Column) -> RepoResult<Column> {
        let row: ColumnRow = self
            .client
            .insert(COLUMNS_TABLE, &ColumnRow::from_column(column, &self.owner))
            .await?;
        Ok(row.into_column())
    }

    async fn update_column(&self, column: &Column) -> RepoResult<Column> {
        let row: ColumnRow = self
            .client
            .update(
                COLUMNS_TABLE,
                &self.by_id(&column.id),
                &ColumnRow::from_column(column, &self.owner),
            )
            .await?;
        Ok(row.into_column())
    }

    async fn delete_column(&self, id: &str) -> RepoResult<()> {
        self.client.delete(COLUMNS_TABLE, &self.by_id(id)).await
    }

    async fn reorder_columns(&self, columns: &[Column]) -> RepoResult<Vec<Column>> {
        let reordered: Vec<Column> = columns
            .iter()
            .enumerate()
            .map(|(index, column)| Column {
                order: index as i64,
                ..column.clone()
            })
            .collect();
        let rows: Vec<ColumnRow> = reordered
            .iter()
            .map(|column| ColumnRow::from_column(column, &self.owner))
            .collect();

        self.client.upsert(COLUMNS_TABLE, "id", &rows).await?;

        Ok(reordered)
    }
}

pub struct RelationalSettingsRepository {
    client: RestClient,
    owner: String,
}

#[async_trait]
impl SettingsRepository for RelationalSettingsRepository {
    async fn get_theme(&self) -> RepoResult<Theme> {
        let query = vec![
            ("select", "user_id,theme".to_string()),
            ("user_id", eq(&self.owner)),
        ];
        let row: Option<SettingsRow> = self.client.select_single(SETTINGS_TABLE, &query).await?;
        Ok(row.map(|r| r.theme()).unwrap_or_default())
    }

    async fn set_theme(&self, theme: Theme) -> RepoResult<Theme> {
        self.client
            .upsert(SETTINGS_TABLE, "user_id", &SettingsRow::new(&self.owner, theme))
            .await?;
        Ok(theme)
    }
}

pub struct RelationalProvider {
    client: RestClient,
    tasks: RelationalTaskRepository,
    columns: RelationalColumnRepository,
    settings: RelationalSettingsRepository,
}

impl RelationalProvider {
    /// Fails with [`KanbanError::Config`] when the endpoint or access key is missing.
    pub fn new(config: RelationalConfig) -> Result<Self, KanbanError> {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(
        config: RelationalConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, KanbanError> {
        if config.url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(KanbanError::Config(
                "relational backend credentials not configured; set BOARD_REMOTE_URL and BOARD_REMOTE_KEY".into(),
            ));
        }

        let owner = if config.owner_id.trim().is_empty() {
            DEFAULT_OWNER.to_string()
        } else {
            config.owner_id
        };
        let client = RestClient::new(http_client, &config.url, &config.api_key);

        Ok(Self {
            tasks: RelationalTaskRepository {
                client: client.clone(),
                owner: owner.clone(),
            },
            columns: RelationalColumnRepository {
                client: client.clone(),
                owner: owner.clone(),
            },
            settings: RelationalSettingsRepository {
                client: client.clone(),
                owner,
            },
            client,
        })
    }

    pub fn owner(&self) -> &str {
        &self.tasks.owner
    }
}

#[async_trait]
impl DataProvider for RelationalProvider {
    fn name(&self) -> &str {
        "relational"
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
        let query = vec![("select", "id".to_string()), ("limit", "1".to_string())];
        if let Err(err) = self
            .client
            .select::<serde_json::Value>(COLUMNS_TABLE, &query)
            .await
        {
            tracing::warn!(provider = self.name(), error = %err, "Connection check failed");
            return Err(KanbanError::Connectivity(format!(
                "relational backend connection failed: {}",
                err
            )));
        }

        tracing::info!(provider = self.name(), owner = self.owner(), "Provider initialized and connected");
        Ok(())
    }

    async fn disconnect(&self) {
        // HTTP connections are pooled by the client and dropped with it.
        tracing::info!(provider = self.name(), "Provider disconnected");
    }
}
