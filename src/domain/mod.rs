pub mod board;
pub mod column;
pub mod error;
pub mod task;
pub mod theme;

pub use board::Board;
pub use column::{Column, PresetColor, PRESET_COLORS};
pub use error::{ErrorInfo, ErrorKind, KanbanError, RepoResult};
pub use task::{Comment, Priority, Task};
pub use theme::Theme;

/// Current time as epoch milliseconds, the timestamp unit used by every entity.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
