//! The board synchronization context.
//!
//! [`BoardSync`] owns the only cache of tasks, columns and theme. Form-style writes
//! go to the provider and then pull canonical state back. Drag-and-drop writes
//! update the cache first and persist afterwards. Every load runs the order
//! normalizer and repairs stored positions in the background.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::domain::{Column, Comment, ErrorInfo, KanbanError, RepoResult, Task, Theme};
use crate::repository::DataProvider;

use super::batch::run_batch;
use super::events::SyncEvent;
use super::normalizer::{normalize_task_order, Normalized};
use super::reorder::{self, Reordered};

const EVENT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCache {
    pub tasks: Vec<Task>,
    pub columns: Vec<Column>,
    pub theme: Theme,
    pub loading: bool,
    pub last_error: Option<ErrorInfo>,
}

/// What a drag-and-drop request did. Ignored moves (same id, unknown ids) report
/// `moved: false` and issue no writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub moved: bool,
    pub writes: usize,
}

impl MoveOutcome {
    fn ignored() -> Self {
        Self {
            moved: false,
            writes: 0,
        }
    }
}

pub struct BoardSync {
    provider: Arc<dyn DataProvider>,
    cache: RwLock<BoardCache>,
    events: broadcast::Sender<SyncEvent>,
    repairs: Mutex<Vec<JoinHandle<()>>>,
}

impl BoardSync {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            cache: RwLock::new(BoardCache {
                loading: true,
                ..BoardCache::default()
            }),
            events,
            repairs: Mutex::new(Vec::new()),
        }
    }

    pub fn provider(&self) -> &Arc<dyn DataProvider> {
        &self.provider
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> BoardCache {
        self.cache.read().await.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.cache.read().await.tasks.clone()
    }

    pub async fn columns(&self) -> Vec<Column> {
        self.cache.read().await.columns.clone()
    }

    pub async fn theme(&self) -> Theme {
        self.cache.read().await.theme
    }

    pub async fn is_loading(&self) -> bool {
        self.cache.read().await.loading
    }

    pub async fn last_error(&self) -> Option<ErrorInfo> {
        self.cache.read().await.last_error.clone()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Connects the provider and loads everything. A failed connection is recorded
    /// and leaves the cache empty with loading cleared.
    pub async fn initialize(&self) -> RepoResult<()> {
        tracing::info!(provider = self.provider.name(), "Initializing board sync");

        if let Err(err) = self.provider.initialize().await {
            let err = self.surfaced(err).await;
            self.set_loading(false).await;
            return Err(err);
        }

        self.refresh_all().await
    }

    /// Waits for background order repairs, then releases the provider.
    pub async fn shutdown(&self) {
        self.wait_for_repairs().await;
        self.provider.disconnect().await;
    }

    pub async fn wait_for_repairs(&self) {
        for handle in self.take_repairs() {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "Order repair task aborted");
            }
        }
    }

    // ── Loading ───────────────────────────────────────────────

    /// Reads all tasks, normalizes their order and replaces the cache. On failure the
    /// previous tasks stay in place.
    pub async fn refresh_tasks(&self) -> RepoResult<()> {
        self.clear_error().await;
        self.load_tasks().await
    }

    pub async fn refresh_columns(&self) -> RepoResult<()> {
        self.clear_error().await;
        self.load_columns().await
    }

    async fn load_tasks(&self) -> RepoResult<()> {
        let raw = match self.provider.tasks().get_tasks().await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "Task refresh failed, keeping cached tasks");
                return Err(self.surfaced(err).await);
            }
        };

        let Normalized { tasks, changed } = normalize_task_order(raw);
        let count = tasks.len();
        self.cache.write().await.tasks = tasks;
        self.emit(SyncEvent::TasksChanged { count });

        if !changed.is_empty() {
            self.spawn_repair(changed);
        }
        Ok(())
    }

    async fn load_columns(&self) -> RepoResult<()> {
        let mut columns = match self.provider.columns().get_columns().await {
            Ok(columns) => columns,
            Err(err) => {
                tracing::warn!(error = %err, "Column refresh failed, keeping cached columns");
                return Err(self.surfaced(err).await);
            }
        };
        columns.sort_by_key(|c| c.order);

        let count = columns.len();
        self.cache.write().await.columns = columns;
        self.emit(SyncEvent::ColumnsChanged { count });
        Ok(())
    }

    /// Theme failures are logged only; the cached theme stays.
    pub async fn refresh_theme(&self) -> RepoResult<()> {
        match self.provider.settings().get_theme().await {
            Ok(theme) => {
                self.cache.write().await.theme = theme;
                self.emit(SyncEvent::ThemeApplied { theme });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Theme refresh failed");
                Err(err)
            }
        }
    }

    /// Refreshes all three collections concurrently under one loading flag and
    /// returns the first failure, if any. A failure from any of them stays in
    /// `last_error` after the others succeed.
    pub async fn refresh_all(&self) -> RepoResult<()> {
        self.set_loading(true).await;
        self.clear_error().await;
        let (tasks, columns, theme) = tokio::join!(
            self.load_tasks(),
            self.load_columns(),
            self.refresh_theme()
        );
        self.set_loading(false).await;

        tasks.and(columns).and(theme)
    }

    pub async fn set_tasks_optimistic(&self, tasks: Vec<Task>) {
        let count = tasks.len();
        self.cache.write().await.tasks = tasks;
        self.emit(SyncEvent::TasksChanged { count });
    }

    pub async fn set_columns_optimistic(&self, columns: Vec<Column>) {
        let count = columns.len();
        self.cache.write().await.columns = columns;
        self.emit(SyncEvent::ColumnsChanged { count });
    }

    // ── Tasks ─────────────────────────────────────────────────

    pub async fn get_task_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        self.provider.tasks().get_task_by_id(id).await
    }

    pub async fn get_column_by_id(&self, id: &str) -> RepoResult<Option<Column>> {
        self.provider.columns().get_column_by_id(id).await
    }

    /// Places the task at the end of its column, persists it and reloads tasks.
    pub async fn create_task(&self, mut task: Task) -> RepoResult<Task> {
        if task.title.trim().is_empty() {
            return Err(KanbanError::Validation("task title is required".into()));
        }
        self.require_column(&task.column_id).await?;

        let siblings = self
            .report(self.provider.tasks().get_tasks_by_column(&task.column_id).await)
            .await?;
        let order = reorder::next_order(&siblings, &task.column_id).ok_or_else(|| {
            KanbanError::Validation(format!(
                "column {} has no free position; reorder its tasks first",
                task.column_id
            ))
        })?;
        task.order = Some(order);

        let created = self
            .report(self.provider.tasks().create_task(&task).await)
            .await?;
        tracing::info!(task_id = created.id.as_str(), column_id = created.column_id.as_str(), "Task created");

        self.settle_tasks().await;
        Ok(created)
    }

    pub async fn update_task(&self, task: &Task) -> RepoResult<Task> {
        let updated = self.update_task_silent(task).await?;
        self.settle_tasks().await;
        Ok(updated)
    }

    /// Persists the task without reloading the cache.
    pub async fn update_task_silent(&self, task: &Task) -> RepoResult<Task> {
        if task.title.trim().is_empty() {
            return Err(KanbanError::Validation("task title is required".into()));
        }
        self.report(self.provider.tasks().update_task(task).await).await
    }

    pub async fn delete_task(&self, id: &str) -> RepoResult<()> {
        self.report(self.provider.tasks().delete_task(id).await)
            .await?;
        tracing::info!(task_id = id, "Task deleted");
        self.settle_tasks().await;
        Ok(())
    }

    pub async fn add_comment(
        &self,
        task_id: &str,
        text: &str,
        author: &str,
        author_avatar: Option<String>,
    ) -> RepoResult<Comment> {
        if text.trim().is_empty() {
            return Err(KanbanError::Validation("comment text is required".into()));
        }

        let mut task = self.require_task(task_id).await?;
        let comment = task.add_comment(text.trim(), author, author_avatar).clone();
        self.update_task(&task).await?;
        Ok(comment)
    }

    pub async fn remove_comment(&self, task_id: &str, comment_id: &str) -> RepoResult<()> {
        let mut task = self.require_task(task_id).await?;
        if !task.remove_comment(comment_id) {
            return Err(KanbanError::NotFound(format!("comment {}", comment_id)));
        }
        self.update_task(&task).await?;
        Ok(())
    }

    // ── Columns ───────────────────────────────────────────────

    /// Appends the column after the current last one.
    pub async fn create_column(&self, mut column: Column) -> RepoResult<Column> {
        if column.name.trim().is_empty() {
            return Err(KanbanError::Validation("column name is required".into()));
        }

        column.order = reorder::next_position(&self.cache.read().await.columns).ok_or_else(|| {
            KanbanError::Validation("no free column position; reorder the columns first".into())
        })?;

        let created = self
            .report(self.provider.columns().create_column(&column).await)
            .await?;
        tracing::info!(column_id = created.id.as_str(), order = created.order, "Column created");

        self.settle_columns().await;
        Ok(created)
    }

    pub async fn update_column(&self, column: &Column) -> RepoResult<Column> {
        if column.name.trim().is_empty() {
            return Err(KanbanError::Validation("column name is required".into()));
        }

        let updated = self
            .report(self.provider.columns().update_column(column).await)
            .await?;
        self.settle_columns().await;
        Ok(updated)
    }

    /// Deletes a column. With `cascade` its tasks are deleted first, one at a time;
    /// a failure there stops before the column itself is touched. Returns the number
    /// of tasks deleted.
    pub async fn delete_column(&self, id: &str, cascade: bool) -> RepoResult<usize> {
        let mut deleted_tasks = 0;

        if cascade {
            let doomed = self
                .report(self.provider.tasks().get_tasks_by_column(id).await)
                .await?;
            let provider = Arc::clone(&self.provider);
            let result = run_batch(
                doomed,
                |task| task.id.clone(),
                |task| {
                    let provider = Arc::clone(&provider);
                    async move { provider.tasks().delete_task(&task.id).await }
                },
            )
            .await;

            match result {
                Ok(count) => deleted_tasks = count,
                Err(err) => {
                    self.settle_tasks().await;
                    return Err(self.surfaced(err).await);
                }
            }
        }

        self.report(self.provider.columns().delete_column(id).await)
            .await?;
        tracing::info!(column_id = id, deleted_tasks, "Column deleted");

        self.settle_columns().await;
        if cascade {
            self.settle_tasks().await;
        }
        Ok(deleted_tasks)
    }

    /// Persists `columns` as the new board sequence, positions taken from the slice.
    pub async fn reorder_columns(&self, columns: Vec<Column>) -> RepoResult<Vec<Column>> {
        let dense: Vec<Column> = columns
            .into_iter()
            .enumerate()
            .map(|(index, column)| Column {
                order: index as i64,
                ..column
            })
            .collect();

        let saved = self
            .report(self.provider.columns().reorder_columns(&dense).await)
            .await?;
        self.settle_columns().await;
        Ok(saved)
    }

    // ── Drag and drop ─────────────────────────────────────────

    /// Moves a task to the end of another column. The cache is updated before the
    /// write is issued.
    pub async fn move_task_to_column(&self, task_id: &str, column_id: &str) -> RepoResult<MoveOutcome> {
        let (moved, next) = {
            let cache = self.cache.read().await;
            if !cache.columns.iter().any(|c| c.id == column_id) {
                return Ok(MoveOutcome::ignored());
            }
            let Some(moved) = reorder::move_across(&cache.tasks, task_id, column_id) else {
                return Ok(MoveOutcome::ignored());
            };
            let next = reorder::splice(&cache.tasks, std::slice::from_ref(&moved));
            (moved, next)
        };

        self.set_tasks_optimistic(next).await;
        self.report(self.provider.tasks().update_task(&moved).await)
            .await?;
        tracing::debug!(task_id, column_id, order = moved.order, "Task moved across columns");

        Ok(MoveOutcome {
            moved: true,
            writes: 1,
        })
    }

    /// Drops `task_id` onto `target_task_id`. Within a column the dragged task takes
    /// the target's slot; across columns it goes to the end of the target's column.
    pub async fn reorder_task(&self, task_id: &str, target_task_id: &str) -> RepoResult<MoveOutcome> {
        if task_id == target_task_id {
            return Ok(MoveOutcome::ignored());
        }

        let (dragged_column, target_column, group) = {
            let cache = self.cache.read().await;
            let column_of = |id: &str| {
                cache
                    .tasks
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| t.column_id.clone())
            };
            let (Some(dragged), Some(target)) = (column_of(task_id), column_of(target_task_id)) else {
                return Ok(MoveOutcome::ignored());
            };
            let group = reorder::column_group(&cache.tasks, &dragged);
            (dragged, target, group)
        };

        if dragged_column != target_column {
            return self.move_task_to_column(task_id, &target_column).await;
        }

        match reorder::move_onto(&group, task_id, target_task_id) {
            Some(reordered) => self.apply_task_group(reordered).await,
            None => Ok(MoveOutcome::ignored()),
        }
    }

    pub async fn move_task_to_index(&self, task_id: &str, index: usize) -> RepoResult<MoveOutcome> {
        let Some(group) = self.group_of(task_id).await else {
            return Ok(MoveOutcome::ignored());
        };

        match reorder::move_to_index(&group, task_id, index) {
            Some(reordered) => self.apply_task_group(reordered).await,
            None => Ok(MoveOutcome::ignored()),
        }
    }

    pub async fn move_task_to_top(&self, task_id: &str) -> RepoResult<MoveOutcome> {
        self.move_task_to_index(task_id, 0).await
    }

    pub async fn move_task_to_bottom(&self, task_id: &str) -> RepoResult<MoveOutcome> {
        let Some(group) = self.group_of(task_id).await else {
            return Ok(MoveOutcome::ignored());
        };
        self.move_task_to_index(task_id, group.len().saturating_sub(1))
            .await
    }

    /// Drops column `dragged` onto column `target` and persists the whole sequence in
    /// one call.
    pub async fn move_column(&self, dragged: &str, target: &str) -> RepoResult<MoveOutcome> {
        let columns = self.columns().await;
        let Some(Reordered { group, changed }) = reorder::move_onto(&columns, dragged, target) else {
            return Ok(MoveOutcome::ignored());
        };

        self.set_columns_optimistic(group.clone()).await;
        self.report(self.provider.columns().reorder_columns(&group).await)
            .await?;
        tracing::debug!(column_id = dragged, target, writes = changed.len(), "Column moved");

        Ok(MoveOutcome {
            moved: true,
            writes: changed.len(),
        })
    }

    // ── Theme ─────────────────────────────────────────────────

    /// The cached theme only changes once the new value is persisted.
    pub async fn set_theme(&self, theme: Theme) -> RepoResult<Theme> {
        let saved = self
            .report(self.provider.settings().set_theme(theme).await)
            .await?;
        self.cache.write().await.theme = saved;
        self.emit(SyncEvent::ThemeApplied { theme: saved });
        Ok(saved)
    }

    pub async fn toggle_theme(&self) -> RepoResult<Theme> {
        let current = self.theme().await;
        self.set_theme(current.toggled()).await
    }

    // ── Internals ─────────────────────────────────────────────

    async fn apply_task_group(&self, reordered: Reordered<Task>) -> RepoResult<MoveOutcome> {
        let next = reorder::splice(&self.tasks().await, &reordered.group);
        self.set_tasks_optimistic(next).await;

        let provider = Arc::clone(&self.provider);
        let result = run_batch(
            reordered.changed,
            |task| task.id.clone(),
            |task| {
                let provider = Arc::clone(&provider);
                async move { provider.tasks().update_task(&task).await.map(|_| ()) }
            },
        )
        .await;

        match result {
            Ok(writes) => Ok(MoveOutcome {
                moved: true,
                writes,
            }),
            Err(err) => Err(self.surfaced(err).await),
        }
    }

    async fn group_of(&self, task_id: &str) -> Option<Vec<Task>> {
        let cache = self.cache.read().await;
        let column_id = cache.tasks.iter().find(|t| t.id == task_id)?.column_id.clone();
        Some(reorder::column_group(&cache.tasks, &column_id))
    }

    async fn require_task(&self, id: &str) -> RepoResult<Task> {
        self.report(self.provider.tasks().get_task_by_id(id).await)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("task {}", id)))
    }

    async fn require_column(&self, id: &str) -> RepoResult<()> {
        let cached = self.cache.read().await.columns.iter().any(|c| c.id == id);
        if cached {
            return Ok(());
        }

        match self
            .report(self.provider.columns().get_column_by_id(id).await)
            .await?
        {
            Some(_) => Ok(()),
            None => Err(KanbanError::Validation(format!("column {} does not exist", id))),
        }
    }

    /// Writes the changed positions back without blocking the caller. Failures are
    /// logged; the next load repairs them again.
    fn spawn_repair(&self, changed: Vec<Task>) {
        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();

        tracing::debug!(count = changed.len(), "Scheduling task order repair");
        let handle = tokio::spawn(async move {
            let writes = changed.iter().map(|task| provider.tasks().update_task(task));
            let results = futures::future::join_all(writes).await;

            let mut failed = 0;
            for (task, result) in changed.iter().zip(&results) {
                if let Err(err) = result {
                    failed += 1;
                    tracing::warn!(task_id = task.id.as_str(), error = %err, "Order repair write failed");
                }
            }

            let repaired = changed.len() - failed;
            tracing::debug!(repaired, failed, "Task order repair finished");
            let _ = events.send(SyncEvent::OrderRepaired { repaired, failed });
        });

        if let Ok(mut repairs) = self.repairs.lock() {
            repairs.retain(|h| !h.is_finished());
            repairs.push(handle);
        }
    }

    fn take_repairs(&self) -> Vec<JoinHandle<()>> {
        match self.repairs.lock() {
            Ok(mut repairs) => repairs.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn settle_tasks(&self) {
        if let Err(err) = self.refresh_tasks().await {
            tracing::debug!(error = %err, "Task reload after write failed");
        }
    }

    async fn settle_columns(&self) {
        if let Err(err) = self.refresh_columns().await {
            tracing::debug!(error = %err, "Column reload after write failed");
        }
    }

    async fn clear_error(&self) {
        self.cache.write().await.last_error = None;
    }

    async fn set_loading(&self, loading: bool) {
        let changed = {
            let mut cache = self.cache.write().await;
            let changed = cache.loading != loading;
            cache.loading = loading;
            changed
        };
        if changed {
            self.emit(SyncEvent::LoadingChanged { loading });
        }
    }

    async fn report<T>(&self, result: RepoResult<T>) -> RepoResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => Err(self.surfaced(err).await),
        }
    }

    /// Records the error in the cache and notifies subscribers.
    async fn surfaced(&self, err: KanbanError) -> KanbanError {
        let info = err.info();
        self.cache.write().await.last_error = Some(info.clone());
        self.emit(SyncEvent::Error { error: info });
        err
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
