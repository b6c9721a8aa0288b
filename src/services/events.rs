use serde::{Deserialize, Serialize};

use crate::domain::{ErrorInfo, Theme};

/// Notifications pushed to whatever renders the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
    TasksChanged { count: usize },
    ColumnsChanged { count: usize },
    ThemeApplied { theme: Theme },
    LoadingChanged { loading: bool },
    /// Background order repair finished; `failed` writes were logged and dropped.
    OrderRepaired { repaired: usize, failed: usize },
    Error { error: ErrorInfo },
}
