use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub order: i64,
}

impl Column {
    /// New column with order 0; the sync context places it at the end of the board.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: format!("col-{}", Uuid::new_v4()),
            name: name.into(),
            color: color.into(),
            order: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresetColor {
    pub name: &'static str,
    pub value: &'static str,
}

pub const PRESET_COLORS: &[PresetColor] = &[
    PresetColor { name: "Purple", value: "oklch(0.45 0.15 285)" },
    PresetColor { name: "Cyan", value: "oklch(0.75 0.15 195)" },
    PresetColor { name: "Green", value: "oklch(0.65 0.18 145)" },
    PresetColor { name: "Orange", value: "oklch(0.70 0.15 50)" },
    PresetColor { name: "Pink", value: "oklch(0.70 0.20 350)" },
    PresetColor { name: "Yellow", value: "oklch(0.80 0.15 90)" },
    PresetColor { name: "Red", value: "oklch(0.55 0.22 25)" },
    PresetColor { name: "Blue", value: "oklch(0.55 0.20 250)" },
    PresetColor { name: "Teal", value: "oklch(0.60 0.15 180)" },
    PresetColor { name: "Indigo", value: "oklch(0.50 0.18 270)" },
];
