pub mod board;
pub mod columns;
pub mod tasks;

pub use board::{BoardResponse, ExportQuery, ThemeRequest, ThemeResponse};
pub use columns::{CreateColumnRequest, DeleteColumnQuery, MoveColumnRequest, UpdateColumnRequest};
pub use tasks::{
    CreateCommentRequest, CreateTaskRequest, MoveTaskRequest, ReorderTaskRequest, UpdateTaskRequest,
};
