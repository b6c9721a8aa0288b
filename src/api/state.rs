use std::sync::Arc;

use crate::config::Config;
use crate::services::BoardSync;

#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<BoardSync>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(sync: Arc<BoardSync>, config: Arc<Config>) -> Self {
        Self { sync, config }
    }
}
