use serde::{Deserialize, Serialize};

use super::{Column, Task};

/// Full column and task set. Only used as the unit of export/import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
}
