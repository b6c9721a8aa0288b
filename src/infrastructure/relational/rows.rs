//! Row shapes of the relational backend and their translation to domain entities.
//!
//! Rows use snake_case names, carry the owner id, and store timestamps as ISO-8601
//! strings. Optional fields missing from a row fall back to defaults: `order` to 0,
//! collections to empty.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{now_millis, Column, Comment, Priority, Task, Theme};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub column_id: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl TaskRow {
    pub fn from_task(task: &Task, owner: &str) -> Self {
        Self {
            id: task.id.clone(),
            user_id: Some(owner.to_string()),
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            created_at: Some(millis_to_iso(task.created_at)),
            points: Some(i64::from(task.points)),
            tags: Some(task.tags.clone()),
            column_id: task.column_id.clone(),
            priority: Some(task.priority.as_str().to_string()),
            comments: Some(task.comments.clone()),
            order: Some(task.order.unwrap_or(0)),
        }
    }

    pub fn into_task(self) -> Task {
        let priority = self
            .priority
            .as_deref()
            .and_then(|p| p.parse::<Priority>().ok())
            .unwrap_or_default();

        Task {
            created_at: self
                .created_at
                .as_deref()
                .and_then(iso_to_millis)
                .unwrap_or_else(now_millis),
            id: self.id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            points: self.points.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32,
            tags: self.tags.unwrap_or_default(),
            column_id: self.column_id,
            priority,
            comments: self.comments.unwrap_or_default(),
            order: Some(self.order.unwrap_or(0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl ColumnRow {
    pub fn from_column(column: &Column, owner: &str) -> Self {
        Self {
            id: column.id.clone(),
            user_id: Some(owner.to_string()),
            name: Some(column.name.clone()),
            color: Some(column.color.clone()),
            order: Some(column.order),
        }
    }

    pub fn into_column(self) -> Column {
        Column {
            id: self.id,
            name: self.name.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
            order: self.order.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRow {
    pub user_id: String,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl SettingsRow {
    pub fn new(owner: &str, theme: Theme) -> Self {
        Self {
            user_id: owner.to_string(),
            theme: Some(theme.as_str().to_string()),
            updated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// Unknown or missing themes read as the default.
    pub fn theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(|t| t.parse::<Theme>().ok())
            .unwrap_or_default()
    }
}

pub fn millis_to_iso(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339 and zone-less timestamps (read as UTC).
pub fn iso_to_millis(value: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp_millis());
    }
    match NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc().timestamp_millis()),
        Err(err) => {
            tracing::debug!(value, error = %err, "Unparseable row timestamp");
            None
        }
    }
}
