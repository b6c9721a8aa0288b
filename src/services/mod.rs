mod batch;
pub mod events;
pub mod normalizer;
pub mod reorder;
pub mod sync;
pub mod transfer;

pub use events::SyncEvent;
pub use normalizer::{normalize_task_order, Normalized};
pub use sync::{BoardCache, BoardSync, MoveOutcome};
pub use transfer::{
    export_board, import_board, validate_document, BoardDocument, ImportPreview, ImportSummary,
    EXPORT_VERSION,
};
