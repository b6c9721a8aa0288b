use serde::{Deserialize, Serialize};

use crate::domain::{Column, ErrorInfo, PresetColor, Task, Theme};
use crate::services::BoardCache;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub provider: String,
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
    pub theme: Theme,
    pub loading: bool,
    pub last_error: Option<ErrorInfo>,
    pub preset_colors: &'static [PresetColor],
}

impl BoardResponse {
    pub fn new(provider: &str, cache: BoardCache, preset_colors: &'static [PresetColor]) -> Self {
        Self {
            provider: provider.to_string(),
            columns: cache.columns,
            tasks: cache.tasks,
            theme: cache.theme,
            loading: cache.loading,
            last_error: cache.last_error,
            preset_colors,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub name: Option<String>,
}
