pub mod db;
pub mod embedded;
pub mod relational;

use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::domain::KanbanError;
use crate::repository::DataProvider;

pub use embedded::EmbeddedProvider;
pub use relational::{RelationalConfig, RelationalProvider};

/// Builds the provider selected by configuration.
pub async fn connect(config: &Config) -> Result<Arc<dyn DataProvider>, KanbanError> {
    match config.backend {
        BackendKind::Embedded => {
            let provider = EmbeddedProvider::open(&config.database_url).await?;
            Ok(Arc::new(provider))
        }
        BackendKind::Relational => {
            let provider = RelationalProvider::new(RelationalConfig {
                url: config.remote_url.clone().unwrap_or_default(),
                api_key: config.remote_key.clone().unwrap_or_default(),
                owner_id: config.owner_id.clone(),
            })?;
            Ok(Arc::new(provider))
        }
    }
}
