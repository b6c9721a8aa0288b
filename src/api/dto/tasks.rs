use serde::Deserialize;

use crate::domain::{Priority, Task};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub column_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl CreateTaskRequest {
    pub fn into_task(self) -> Task {
        let mut task = Task::new(self.title.trim(), self.column_id);
        task.description = self.description.unwrap_or_default();
        task.points = self.points.unwrap_or(0);
        task.tags = self.tags.unwrap_or_default();
        task.priority = self.priority.unwrap_or_default();
        task
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl UpdateTaskRequest {
    /// Overwrites only the fields present in the request.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(points) = self.points {
            task.points = points;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskRequest {
    pub column_id: String,
}

/// Either drop onto another task or move to an index inside the current column.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderTaskRequest {
    #[serde(default)]
    pub target_task_id: Option<String>,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<String>,
}
