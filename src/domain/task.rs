use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_millis;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn all() -> &'static [Priority] {
        &[
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A comment lives inside its task and is persisted only as part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created_at: i64,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_at: i64,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub column_id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Position within the owning column. Absent on rows written before ordering
    /// existed; the order normalizer fills it in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl Task {
    pub fn new(title: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            id: format!("task-{}", Uuid::new_v4()),
            title: title.into(),
            description: String::new(),
            created_at: now_millis(),
            points: 0,
            tags: Vec::new(),
            column_id: column_id.into(),
            priority: Priority::default(),
            comments: Vec::new(),
            order: None,
        }
    }

    pub fn add_comment(
        &mut self,
        text: impl Into<String>,
        author: impl Into<String>,
        author_avatar: Option<String>,
    ) -> &Comment {
        self.comments.push(Comment {
            id: format!("comment-{}", Uuid::new_v4()),
            text: text.into(),
            created_at: now_millis(),
            author: author.into(),
            author_avatar,
        });
        // just pushed
        &self.comments[self.comments.len() - 1]
    }

    /// Returns `false` when no comment carries `comment_id`.
    pub fn remove_comment(&mut self, comment_id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != comment_id);
        self.comments.len() != before
    }
}
