use serde::Deserialize;

use crate::domain::{Column, PRESET_COLORS};

#[derive(Debug, Deserialize)]
pub struct CreateColumnRequest {
    pub name: String,
    /// Defaults to the first preset color.
    #[serde(default)]
    pub color: Option<String>,
}

impl CreateColumnRequest {
    pub fn into_column(self) -> Column {
        let color = self
            .color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| PRESET_COLORS[0].value.to_string());
        Column::new(self.name.trim(), color)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateColumnRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteColumnQuery {
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveColumnRequest {
    pub target_column_id: String,
}
