#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use kanban_sync::api::{create_router, AppState};
use kanban_sync::config::Config;
use kanban_sync::domain::{Column, KanbanError, RepoResult, Task, Theme};
use kanban_sync::repository::{ColumnRepository, DataProvider, SettingsRepository, TaskRepository};
use kanban_sync::services::BoardSync;

// ── Fixtures ──────────────────────────────────────────────────

pub fn column(id: &str, name: &str, order: i64) -> Column {
    let mut column = Column::new(name, "oklch(0.55 0.20 250)");
    column.id = id.to_string();
    column.order = order;
    column
}

pub fn task(id: &str, column_id: &str, order: Option<i64>, created_at: i64) -> Task {
    let mut task = Task::new(format!("Task {}", id), column_id);
    task.id = id.to_string();
    task.order = order;
    task.created_at = created_at;
    task
}

/// `(id, order)` pairs of one column, sorted by order.
pub fn layout(tasks: &[Task], column_id: &str) -> Vec<(String, i64)> {
    let mut pairs: Vec<(String, i64)> = tasks
        .iter()
        .filter(|t| t.column_id == column_id)
        .map(|t| (t.id.clone(), t.order.unwrap_or(-1)))
        .collect();
    pairs.sort_by_key(|(_, order)| *order);
    pairs
}

// ── In-memory provider ────────────────────────────────────────

/// Provider double kept entirely in memory, with switches to make calls fail.
#[derive(Default)]
pub struct MemoryProvider {
    tasks: Mutex<Vec<Task>>,
    columns: Mutex<Vec<Column>>,
    theme: Mutex<Theme>,
    pub fail_init: AtomicBool,
    pub fail_reads: AtomicBool,
    /// Fails `get_tasks` only; columns and theme still load.
    pub fail_task_list: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Task updates allowed before every further one fails.
    update_budget: Mutex<Option<usize>>,
    pub update_calls: AtomicUsize,
    pub disconnected: AtomicBool,
}

impl MemoryProvider {
    pub fn seeded(columns: Vec<Column>, tasks: Vec<Task>) -> Arc<Self> {
        let provider = Self::default();
        *provider.columns.lock().unwrap() = columns;
        *provider.tasks.lock().unwrap() = tasks;
        Arc::new(provider)
    }

    pub fn stored_tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn stored_columns(&self) -> Vec<Column> {
        self.columns.lock().unwrap().clone()
    }

    pub fn stored_theme(&self) -> Theme {
        *self.theme.lock().unwrap()
    }

    pub fn fail_updates_after(&self, successes: usize) {
        *self.update_budget.lock().unwrap() = Some(successes);
    }

    pub fn set(&self, flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    fn check_read(&self) -> RepoResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KanbanError::Connectivity("memory provider offline".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KanbanError::backend("memory provider rejected write"));
        }
        Ok(())
    }

    fn check_update(&self) -> RepoResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;

        let mut budget = self.update_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => Err(KanbanError::backend("update budget exhausted")),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskRepository for MemoryProvider {
    async fn get_tasks(&self) -> RepoResult<Vec<Task>> {
        self.check_read()?;
        if self.fail_task_list.load(Ordering::SeqCst) {
            return Err(KanbanError::Connectivity("task listing unavailable".into()));
        }
        Ok(self.stored_tasks())
    }

    async fn get_task_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        self.check_read()?;
        Ok(self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn create_task(&self, task: &Task) -> RepoResult<Task> {
        self.check_write()?;
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task.clone())
    }

    async fn update_task(&self, task: &Task) -> RepoResult<Task> {
        self.check_update()?;
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task.clone();
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> RepoResult<()> {
        self.check_write()?;
        self.tasks.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn get_tasks_by_column(&self, column_id: &str) -> RepoResult<Vec<Task>> {
        self.check_read()?;
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.column_id == column_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ColumnRepository for MemoryProvider {
    async fn get_columns(&self) -> RepoResult<Vec<Column>> {
        self.check_read()?;
        Ok(self.stored_columns())
    }

    async fn get_column_by_id(&self, id: &str) -> RepoResult<Option<Column>> {
        self.check_read()?;
        Ok(self.columns.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn create_column(&self, column: &Column) -> RepoResult<Column> {
        self.check_write()?;
        self.columns.lock().unwrap().push(column.clone());
        Ok(column.clone())
    }

    async fn update_column(&self, column: &Column) -> RepoResult<Column> {
        self.check_write()?;
        let mut columns = self.columns.lock().unwrap();
        if let Some(slot) = columns.iter_mut().find(|c| c.id == column.id) {
            *slot = column.clone();
        }
        Ok(column.clone())
    }

    async fn delete_column(&self, id: &str) -> RepoResult<()> {
        self.check_write()?;
        self.columns.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn reorder_columns(&self, columns: &[Column]) -> RepoResult<Vec<Column>> {
        self.check_write()?;
        *self.columns.lock().unwrap() = columns.to_vec();
        Ok(columns.to_vec())
    }
}

#[async_trait]
impl SettingsRepository for MemoryProvider {
    async fn get_theme(&self) -> RepoResult<Theme> {
        self.check_read()?;
        Ok(self.stored_theme())
    }

    async fn set_theme(&self, theme: Theme) -> RepoResult<Theme> {
        self.check_write()?;
        *self.theme.lock().unwrap() = theme;
        Ok(theme)
    }
}

#[async_trait]
impl DataProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn tasks(&self) -> &dyn TaskRepository {
        self
    }

    fn columns(&self) -> &dyn ColumnRepository {
        self
    }

    fn settings(&self) -> &dyn SettingsRepository {
        self
    }

    async fn initialize(&self) -> RepoResult<()> {
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(KanbanError::Connectivity("memory provider unreachable".into()));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

pub fn sync_over(provider: Arc<MemoryProvider>) -> Arc<BoardSync> {
    Arc::new(BoardSync::new(provider))
}

// ── HTTP helpers ──────────────────────────────────────────────

pub fn test_app(sync: Arc<BoardSync>) -> Router {
    create_router(AppState::new(sync, Arc::new(Config::default())))
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

// ── Mock relational REST backend ──────────────────────────────

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";
const RESERVED_PARAMS: &[&str] = &["select", "order", "limit", "on_conflict"];

#[derive(Clone, Default)]
pub struct MockRest {
    pub api_key: String,
    pub tables: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    /// `"METHOD table"` per request, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl MockRest {
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn insert_row(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serves the mock on an ephemeral local port and returns its base URL.
pub async fn spawn_rest_mock(api_key: &str) -> (String, MockRest) {
    let mock = MockRest {
        api_key: api_key.to_string(),
        ..MockRest::default()
    };

    let app = Router::new()
        .route(
            "/rest/v1/{table}",
            get(rest_select)
                .post(rest_insert)
                .patch(rest_update)
                .delete(rest_delete),
        )
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), mock)
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

type Params = Vec<(String, String)>;

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, params: &Params) -> bool {
    params
        .iter()
        .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
        .all(|(key, filter)| match filter.strip_prefix("eq.") {
            Some(expected) => row.get(key).map(text_of).as_deref() == Some(expected),
            None => true,
        })
}

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn wants_object(headers: &HeaderMap) -> bool {
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(OBJECT_MEDIA_TYPE))
}

fn not_single(count: usize) -> Response {
    (
        StatusCode::NOT_ACCEPTABLE,
        Json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned",
            "details": format!("The result contains {} rows", count),
        })),
    )
        .into_response()
}

fn authorized(mock: &MockRest, headers: &HeaderMap) -> Result<(), Response> {
    let key = headers.get("apikey").and_then(|v| v.to_str().ok());
    if key == Some(mock.api_key.as_str()) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": "401", "message": "Invalid API key"})),
        )
            .into_response())
    }
}

fn log(mock: &MockRest, method: &str, table: &str) {
    mock.requests
        .lock()
        .unwrap()
        .push(format!("{} {}", method, table));
}

fn sort_rows(rows: &mut [Value], order: &str) {
    let (field, direction) = order.split_once('.').unwrap_or((order, "asc"));
    rows.sort_by(|a, b| {
        let (x, y) = (a.get(field), b.get(field));
        let ordering = match (x.and_then(Value::as_f64), y.and_then(Value::as_f64)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => x.map(text_of).cmp(&y.map(text_of)),
        };
        if direction == "desc" {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

async fn rest_select(
    State(mock): State<MockRest>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorized(&mock, &headers) {
        return denied;
    }
    log(&mock, "GET", &table);

    let mut rows: Vec<Value> = mock
        .rows(&table)
        .into_iter()
        .filter(|row| matches(row, &params))
        .collect();
    if let Some(order) = param(&params, "order") {
        sort_rows(&mut rows, order);
    }
    if let Some(limit) = param(&params, "limit").and_then(|l| l.parse().ok()) {
        rows.truncate(limit);
    }

    if wants_object(&headers) {
        if rows.len() != 1 {
            return not_single(rows.len());
        }
        return Json(rows.remove(0)).into_response();
    }
    Json(rows).into_response()
}

async fn rest_insert(
    State(mock): State<MockRest>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&mock, &headers) {
        return denied;
    }

    let incoming = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };

    if let Some(conflict) = param(&params, "on_conflict") {
        log(&mock, "UPSERT", &table);
        let mut tables = mock.tables.lock().unwrap();
        let rows = tables.entry(table).or_default();
        for row in incoming {
            let key = row.get(conflict).cloned();
            match rows.iter_mut().find(|r| r.get(conflict).cloned() == key) {
                Some(existing) => merge(existing, &row),
                None => rows.push(row),
            }
        }
        return StatusCode::CREATED.into_response();
    }

    log(&mock, "POST", &table);
    {
        let mut tables = mock.tables.lock().unwrap();
        tables.entry(table).or_default().extend(incoming.iter().cloned());
    }
    if wants_object(&headers) && incoming.len() == 1 {
        return (StatusCode::CREATED, Json(incoming[0].clone())).into_response();
    }
    (StatusCode::CREATED, Json(incoming)).into_response()
}

async fn rest_update(
    State(mock): State<MockRest>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&mock, &headers) {
        return denied;
    }
    log(&mock, "PATCH", &table);

    let updated: Vec<Value> = {
        let mut tables = mock.tables.lock().unwrap();
        let rows = tables.entry(table).or_default();
        rows.iter_mut()
            .filter(|row| matches(row, &params))
            .map(|row| {
                merge(row, &body);
                row.clone()
            })
            .collect()
    };

    if wants_object(&headers) {
        if updated.len() != 1 {
            return not_single(updated.len());
        }
        return Json(updated[0].clone()).into_response();
    }
    Json(updated).into_response()
}

async fn rest_delete(
    State(mock): State<MockRest>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorized(&mock, &headers) {
        return denied;
    }
    log(&mock, "DELETE", &table);

    let mut tables = mock.tables.lock().unwrap();
    if let Some(rows) = tables.get_mut(&table) {
        rows.retain(|row| !matches(row, &params));
    }
    StatusCode::NO_CONTENT.into_response()
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}
