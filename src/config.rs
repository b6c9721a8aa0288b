use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Embedded,
    Relational,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Embedded => write!(f, "embedded"),
            BackendKind::Relational => write!(f, "relational"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedded" | "local" => Ok(BackendKind::Embedded),
            "relational" | "remote" => Ok(BackendKind::Relational),
            other => Err(format!("Invalid backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub backend: BackendKind,
    pub database_url: String,
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    pub owner_id: String,
    pub cors_origin: String,
}

impl Config {
    /// Reads the process environment. Unset values take their defaults; an unknown
    /// `BOARD_BACKEND` is an error.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let defaults = Self::default();
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let backend = match non_empty("BOARD_BACKEND") {
            Some(value) => value
                .parse::<BackendKind>()
                .map_err(|e| anyhow::anyhow!("BOARD_BACKEND: {}", e))?,
            None => defaults.backend,
        };

        Ok(Self {
            port: var("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            backend,
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            remote_url: non_empty("BOARD_REMOTE_URL"),
            remote_key: non_empty("BOARD_REMOTE_KEY"),
            owner_id: var("BOARD_OWNER_ID").unwrap_or(defaults.owner_id),
            cors_origin: var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21547,
            backend: BackendKind::Embedded,
            database_url: "sqlite:kanban-board.db".into(),
            remote_url: None,
            remote_key: None,
            owner_id: "anonymous".into(),
            cors_origin: "http://localhost:21548,http://127.0.0.1:21548".into(),
        }
    }
}
